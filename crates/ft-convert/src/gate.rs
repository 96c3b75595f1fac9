//! Capability gating: picks between a native layer and a plugin fallback
//! given what the target backend supports.

use crate::context::ConversionCtx;
use crate::error::{ErrorKind, LowerResult};
use ft_backend::{BackendCapabilities, ResizeMode, ShuffleLayer, TensorId};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePath {
    /// Output extents given as a size list.
    Size,
    /// Output extents given as scale factors.
    Scales,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStrategy {
    Native { align_corners: bool },
    Plugin,
}

pub fn select_resize_strategy(
    capabilities: &BackendCapabilities,
    mode: ResizeMode,
    align_corners: bool,
    path: ResizePath,
) -> LowerResult<ResizeStrategy> {
    match mode {
        // nearest ignores the alignment flag
        ResizeMode::Nearest => Ok(ResizeStrategy::Native {
            align_corners: false,
        }),
        ResizeMode::Linear if capabilities.configurable_align_corners => {
            Ok(ResizeStrategy::Native { align_corners })
        }
        ResizeMode::Linear if align_corners => Ok(ResizeStrategy::Native {
            align_corners: true,
        }),
        ResizeMode::Linear => match path {
            ResizePath::Size => Ok(ResizeStrategy::Plugin),
            ResizePath::Scales => Err(ErrorKind::UnsupportedCapabilityCombination(format!(
                "linear resize with align_corners=false from scale factors is not supported by backend {}",
                capabilities.version
            ))),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupNormStrategy {
    Native,
    Plugin,
}

pub fn select_group_norm_strategy(capabilities: &BackendCapabilities) -> GroupNormStrategy {
    if capabilities.fused_group_norm {
        GroupNormStrategy::Native
    } else {
        GroupNormStrategy::Plugin
    }
}

/// Reshapes `input` to at least `rank` dimensions by prepending unit
/// extents. Returns `input` unchanged when it is already wide enough.
pub fn pad_to_rank(ctx: &mut ConversionCtx<'_>, input: TensorId, rank: usize) -> LowerResult<TensorId> {
    let dims = ctx.network().tensor(input)?.dims.clone();
    if dims.rank() >= rank {
        return Ok(input);
    }
    let padded = dims.pad_to(rank);
    let layer = ctx.network_mut().add_shuffle(
        input,
        ShuffleLayer {
            reshape_dims: padded.clone(),
        },
    )?;
    ctx.network_mut()
        .set_layer_name(layer.layer, format!("[Reshape {} to {}]", dims, padded))?;
    debug!("Padded input from {} to {}", dims, padded);
    Ok(layer.output)
}
