use crate::context::ConversionCtx;
use crate::error::LowerResult;
use ft_backend::{ElementWiseOperation, TensorId};
use ft_core::ConstTensor;
use tracing::debug;

/// Marker for "keep the input extent" in a requested output shape.
pub const KEEP_DIM: i64 = -1;

/// Splits a requested output shape into run-time and literal parts.
///
/// For every dimension exactly one of the two masks is non-zero: a kept
/// extent has `dynamic_mask = 1, static_mask = 0`; a literal extent `v` has
/// `dynamic_mask = 0, static_mask = v`. The run-time output shape is
/// `shape(input) * dynamic_mask + static_mask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMask {
    pub dynamic_mask: Vec<i64>,
    pub static_mask: Vec<i64>,
}

impl ShapeMask {
    pub fn from_output_shape(out_shape: &[i64]) -> Self {
        let (dynamic_mask, static_mask) = out_shape
            .iter()
            .map(|dim| if *dim == KEEP_DIM { (1, 0) } else { (0, *dim) })
            .unzip();
        Self {
            dynamic_mask,
            static_mask,
        }
    }

    /// Evaluates the mask against concrete input extents.
    pub fn apply(&self, input_shape: &[i64]) -> Vec<i64> {
        input_shape
            .iter()
            .zip(self.dynamic_mask.iter().zip(&self.static_mask))
            .map(|(dim, (dynamic, fixed))| dim * dynamic + fixed)
            .collect()
    }

    /// Emits `shape(input) * dynamic_mask + static_mask` and returns the
    /// resulting 1-D int32 shape tensor.
    pub fn emit(&self, ctx: &mut ConversionCtx<'_>, input: TensorId) -> LowerResult<TensorId> {
        let dynamic = ctx.tensor_to_const(&ConstTensor::int32_vector(&self.dynamic_mask))?;
        let fixed = ctx.tensor_to_const(&ConstTensor::int32_vector(&self.static_mask))?;
        let network = ctx.network_mut();
        let shape = network.add_shape(input)?;
        let kept = network.add_elementwise(shape.output, dynamic, ElementWiseOperation::Prod)?;
        let target = network.add_elementwise(kept.output, fixed, ElementWiseOperation::Sum)?;
        network.set_layer_name(target.layer, "[Resize output shape]")?;
        debug!(
            "Computed output shape from dynamic mask {:?} and static mask {:?}",
            self.dynamic_mask, self.static_mask
        );
        Ok(target.output)
    }
}

/// Right-aligns `out_size` against the trailing dimensions of `in_shape`;
/// leading dimensions keep the input extent.
pub fn right_align(in_shape: &[i64], out_size: &[i64]) -> Vec<i64> {
    let lead = in_shape.len().saturating_sub(out_size.len());
    in_shape[..lead]
        .iter()
        .map(|_| KEEP_DIM)
        .chain(out_size.iter().copied())
        .collect()
}

/// Replaces keep markers with the matching input extent.
pub fn resolve_kept(in_shape: &[i64], out_shape: &[i64]) -> Vec<i64> {
    in_shape
        .iter()
        .zip(out_shape)
        .map(|(input, output)| if *output == KEEP_DIM { *input } else { *output })
        .collect()
}

/// Left-pads spatial scale factors with `1.0` up to `rank`.
pub fn pad_scales(rank: usize, scales: &[f64]) -> Vec<f32> {
    let lead = rank.saturating_sub(scales.len());
    std::iter::repeat(1.0)
        .take(lead)
        .chain(scales.iter().map(|s| *s as f32))
        .collect()
}
