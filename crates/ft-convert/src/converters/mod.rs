//! Built-in converters and the patterns they are registered under.

pub(crate) mod group_norm;
pub(crate) mod interpolate;

use crate::error::{ErrorKind, LowerResult};
use crate::registry::RegistryBuilder;
use crate::rule::{LoweringRule, ResizeRule};
use ft_core::{Node, ValueId};

const NEAREST_PATTERNS: &[(&str, usize)] = &[
    ("aten::upsample_nearest1d(Tensor self, int[] output_size, float? scales=None) -> (Tensor)", 1),
    ("aten::upsample_nearest1d.vec(Tensor self, int[] output_size, float? scales=None) -> (Tensor)", 1),
    ("aten::upsample_nearest2d(Tensor self, int[2] output_size, float? scales_h=None, float? scales_w=None) -> (Tensor)", 2),
    ("aten::upsample_nearest2d.vec(Tensor self, int[2] output_size, float? scales_h=None, float? scales_w=None) -> (Tensor)", 2),
    ("aten::upsample_nearest3d(Tensor self, int[3] output_size, float? scales_d=None, float? scales_h=None, float? scales_w=None) -> (Tensor)", 3),
];

const LINEAR_PATTERNS: &[(&str, usize)] = &[
    ("aten::upsample_linear1d(Tensor self, int[] output_size, bool align_corners, float? scales=None) -> (Tensor)", 1),
    ("aten::upsample_bilinear2d(Tensor self, int[2] output_size, bool align_corners, float? scales_h=None, float? scales_w=None) -> (Tensor)", 2),
    ("aten::upsample_trilinear3d(Tensor self, int[3] output_size, bool align_corners, float? scales_d=None, float? scales_h=None, float? scales_w=None) -> (Tensor)", 3),
    ("aten::upsample_linear1d.vec(Tensor input, int[]? output_size, bool align_corners, float[]? scale_factors) -> (Tensor)", 1),
    ("aten::upsample_bilinear2d.vec(Tensor input, int[]? output_size, bool align_corners, float[]? scale_factors) -> (Tensor)", 2),
    ("aten::upsample_trilinear3d.vec(Tensor input, int[]? output_size, bool align_corners, float[]? scale_factors) -> (Tensor)", 3),
];

const GROUP_NORM_PATTERN: &str = "aten::group_norm(Tensor input, int num_groups, Tensor? weight=None, Tensor? bias=None, float eps=1e-05, bool cudnn_enabled=True) -> (Tensor)";

pub fn register_defaults(builder: RegistryBuilder) -> RegistryBuilder {
    let builder = NEAREST_PATTERNS
        .iter()
        .fold(builder, |builder, (pattern, rank)| {
            builder.pattern(pattern, LoweringRule::Resize(ResizeRule::nearest(*rank)))
        });
    let builder = LINEAR_PATTERNS
        .iter()
        .fold(builder, |builder, (pattern, rank)| {
            builder.pattern(pattern, LoweringRule::Resize(ResizeRule::linear(*rank)))
        });
    builder.pattern(GROUP_NORM_PATTERN, LoweringRule::GroupNorm)
}

/// The node's single result value.
pub(crate) fn single_output(node: &Node) -> LowerResult<ValueId> {
    match node.outputs() {
        [output] => Ok(*output),
        outputs => Err(ErrorKind::OutputArity {
            expected: 1,
            found: outputs.len(),
        }),
    }
}
