use crate::args::Args;
use crate::context::ConversionCtx;
use crate::converters::{group_norm, interpolate};
use crate::error::LowerResult;
use ft_backend::ResizeMode;
use ft_core::Node;

/// A hand-written converter. Returns `Ok(false)` to report failure without a
/// more specific error.
pub type ConverterFn = fn(&mut ConversionCtx<'_>, &Node, &Args) -> LowerResult<bool>;

/// Parameters shared by the resize family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRule {
    pub mode: ResizeMode,
    /// Number of trailing dimensions the operator resizes (1, 2 or 3).
    pub spatial_rank: usize,
}

impl ResizeRule {
    pub const fn nearest(spatial_rank: usize) -> Self {
        Self {
            mode: ResizeMode::Nearest,
            spatial_rank,
        }
    }

    pub const fn linear(spatial_rank: usize) -> Self {
        Self {
            mode: ResizeMode::Linear,
            spatial_rank,
        }
    }

    /// Interpolation name understood by the `Interpolate` plugin.
    pub fn interpolation_name(&self) -> &'static str {
        match (self.mode, self.spatial_rank) {
            (ResizeMode::Nearest, _) => "nearest",
            (ResizeMode::Linear, 2) => "bilinear",
            (ResizeMode::Linear, 3) => "trilinear",
            (ResizeMode::Linear, _) => "linear",
        }
    }

    /// Plugin instance name, e.g. `bilinear2d`.
    pub fn plugin_instance_name(&self) -> String {
        format!("{}{}d", self.interpolation_name(), self.spatial_rank)
    }
}

/// How a matched node is lowered.
#[derive(Clone, Copy)]
pub enum LoweringRule {
    Resize(ResizeRule),
    GroupNorm,
    Custom(ConverterFn),
}

impl LoweringRule {
    pub fn apply(&self, ctx: &mut ConversionCtx<'_>, node: &Node, args: &Args) -> LowerResult<bool> {
        match self {
            LoweringRule::Resize(rule) => interpolate::convert(ctx, node, args, rule),
            LoweringRule::GroupNorm => group_norm::convert(ctx, node, args),
            LoweringRule::Custom(converter) => converter(ctx, node, args),
        }
    }
}

impl std::fmt::Debug for LoweringRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoweringRule::Resize(rule) => f.debug_tuple("Resize").field(rule).finish(),
            LoweringRule::GroupNorm => f.write_str("GroupNorm"),
            LoweringRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
