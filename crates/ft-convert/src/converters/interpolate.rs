//! Nearest and linear upsampling.
//!
//! The output extents come either from an explicit size list, right-aligned
//! against the trailing input dimensions, or from per-dimension scale factors.
//! A size list becomes a literal output shape when every input extent is
//! known at conversion time; otherwise the shape is computed at run time from
//! the input's shape through a [`ShapeMask`].

use super::single_output;
use crate::args::Args;
use crate::context::ConversionCtx;
use crate::error::{ErrorKind, LowerResult};
use crate::gate::{select_resize_strategy, ResizePath, ResizeStrategy};
use crate::rule::ResizeRule;
use crate::shape::{pad_scales, resolve_kept, right_align, ShapeMask, KEEP_DIM};
use ft_backend::{
    Dims, LayerRef, PluginField, PluginFieldCollection, ResizeLayer, ResizeMode, ResizeOutput,
    TensorId, INTERPOLATE_PLUGIN,
};
use ft_core::Node;
use tracing::{debug, warn};

pub(crate) fn convert(
    ctx: &mut ConversionCtx<'_>,
    node: &Node,
    args: &Args,
    rule: &ResizeRule,
) -> LowerResult<bool> {
    let output = single_output(node)?;
    let input = args
        .get(0)
        .ok_or_else(|| ErrorKind::UnknownParam("self".to_string()))?
        .as_tensor(ctx)?;
    let in_shape = ctx.network().tensor(input)?.dims.to_vec();

    let size = args
        .required("output_size")?
        .opt_int_list()?
        .filter(|size| !size.is_empty());
    let scales = requested_scales(args)?;
    let align_corners = match rule.mode {
        ResizeMode::Linear => args.required("align_corners")?.as_bool()?,
        ResizeMode::Nearest => false,
    };

    let spec = match (size, scales) {
        (Some(_), Some(_)) => return Err(ErrorKind::AmbiguousResizeSpec { found: "both" }),
        (None, None) => return Err(ErrorKind::AmbiguousResizeSpec { found: "neither" }),
        (Some(size), None) => ResizeSpec::Size(size),
        (None, Some(scales)) => ResizeSpec::Scales(scales),
    };
    spec.validate()?;
    if in_shape.len() < rule.spatial_rank {
        return Err(ErrorKind::RankMismatch {
            what: "input",
            expected: rule.spatial_rank,
            found: in_shape.len(),
        });
    }

    let layer = match spec {
        ResizeSpec::Scales(scales) => {
            resize_from_scales(ctx, input, &in_shape, &scales, rule, align_corners)?
        }
        ResizeSpec::Size(size) => resize_from_size(ctx, input, &in_shape, &size, rule, align_corners)?,
    };

    ctx.network_mut().set_layer_name(layer.layer, node.to_string())?;
    ctx.associate_value_and_tensor(output, layer.output)?;
    debug!("Output tensor shape: {}", ctx.network().tensor(layer.output)?.dims);
    Ok(true)
}

enum ResizeSpec {
    Size(Vec<i64>),
    Scales(Vec<f64>),
}

impl ResizeSpec {
    /// Sizes must be positive or the keep marker; scales positive and finite.
    fn validate(&self) -> LowerResult<()> {
        match self {
            ResizeSpec::Size(size) => match size.iter().find(|dim| **dim != KEEP_DIM && **dim <= 0) {
                Some(dim) => Err(ErrorKind::InvalidResizeSpec {
                    what: "output size",
                    value: dim.to_string(),
                }),
                None => Ok(()),
            },
            ResizeSpec::Scales(scales) => {
                match scales.iter().find(|scale| !(scale.is_finite() && **scale > 0.0)) {
                    Some(scale) => Err(ErrorKind::InvalidResizeSpec {
                        what: "scale factors",
                        value: scale.to_string(),
                    }),
                    None => Ok(()),
                }
            }
        }
    }
}

/// A `scale_factors` list, or the individual `scales*` parameters when all of
/// them are present.
fn requested_scales(args: &Args) -> LowerResult<Option<Vec<f64>>> {
    if let Some(arg) = args.named("scale_factors") {
        return Ok(arg.opt_double_list()?.filter(|scales| !scales.is_empty()));
    }
    let scales = args
        .iter()
        .filter(|arg| arg.name().starts_with("scales"))
        .map(|arg| arg.opt_double())
        .collect::<LowerResult<Vec<_>>>()?;
    if scales.is_empty() {
        return Ok(None);
    }
    Ok(scales.into_iter().collect())
}

fn resize_from_scales(
    ctx: &mut ConversionCtx<'_>,
    input: TensorId,
    in_shape: &[i64],
    scales: &[f64],
    rule: &ResizeRule,
    align_corners: bool,
) -> LowerResult<LayerRef> {
    if scales.len() != rule.spatial_rank {
        return Err(ErrorKind::RankMismatch {
            what: "scale factors",
            expected: rule.spatial_rank,
            found: scales.len(),
        });
    }
    let strategy = select_resize_strategy(
        ctx.capabilities(),
        rule.mode,
        align_corners,
        ResizePath::Scales,
    )?;
    let ResizeStrategy::Native { align_corners } = strategy else {
        return Err(ErrorKind::UnsupportedCapabilityCombination(
            "plugin interpolation requires an explicit output size".to_string(),
        ));
    };
    if rule.mode == ResizeMode::Linear && align_corners {
        warn!("align_corners with scale factors may round output extents differently from the source framework");
    }
    let resize = ResizeLayer {
        mode: rule.mode,
        align_corners,
        output: ResizeOutput::Scales(pad_scales(in_shape.len(), scales)),
    };
    Ok(ctx.network_mut().add_resize(input, resize, None)?)
}

fn resize_from_size(
    ctx: &mut ConversionCtx<'_>,
    input: TensorId,
    in_shape: &[i64],
    size: &[i64],
    rule: &ResizeRule,
    align_corners: bool,
) -> LowerResult<LayerRef> {
    if size.len() != rule.spatial_rank {
        return Err(ErrorKind::RankMismatch {
            what: "output size",
            expected: rule.spatial_rank,
            found: size.len(),
        });
    }
    let out_shape = right_align(in_shape, size);
    let shapes_known = !ctx.input_is_dynamic() && in_shape.iter().all(|dim| *dim >= 0);
    let strategy = select_resize_strategy(ctx.capabilities(), rule.mode, align_corners, ResizePath::Size)?;

    match strategy {
        ResizeStrategy::Plugin => {
            interpolate_plugin(ctx, input, in_shape, &out_shape, rule, shapes_known)
        }
        ResizeStrategy::Native { align_corners } if shapes_known => {
            let resize = ResizeLayer {
                mode: rule.mode,
                align_corners,
                output: ResizeOutput::Shape(Dims::new(resolve_kept(in_shape, &out_shape))),
            };
            Ok(ctx.network_mut().add_resize(input, resize, None)?)
        }
        ResizeStrategy::Native { align_corners } => {
            if !ctx.capabilities().dynamic_shape_input {
                return Err(ErrorKind::UnsupportedCapabilityCombination(format!(
                    "resize to a run-time shape needs shape-tensor inputs, which backend {} lacks",
                    ctx.capabilities().version
                )));
            }
            let mask = ShapeMask::from_output_shape(&out_shape);
            let shape = mask.emit(ctx, input)?;
            let resize = ResizeLayer {
                mode: rule.mode,
                align_corners,
                output: ResizeOutput::ShapeTensor,
            };
            Ok(ctx.network_mut().add_resize(input, resize, Some(shape))?)
        }
    }
}

fn interpolate_plugin(
    ctx: &mut ConversionCtx<'_>,
    input: TensorId,
    in_shape: &[i64],
    out_shape: &[i64],
    rule: &ResizeRule,
    shapes_known: bool,
) -> LowerResult<LayerRef> {
    if !shapes_known {
        return Err(ErrorKind::UnsupportedCapabilityCombination(format!(
            "{} with align_corners=false needs static input shapes on backend {}",
            rule.plugin_instance_name(),
            ctx.capabilities().version
        )));
    }
    let out_shape = resolve_kept(in_shape, out_shape);
    let out_size = &out_shape[out_shape.len() - rule.spatial_rank..];
    warn!(
        "Backend {} cannot disable align_corners for {} resize; falling back to the {} plugin, which may be slower",
        ctx.capabilities().version,
        rule.interpolation_name(),
        INTERPOLATE_PLUGIN
    );

    let fields = PluginFieldCollection::new()
        .with(PluginField::int32s("in_shape", to_i32(in_shape)?))
        .with(PluginField::int32s("out_shape", to_i32(&out_shape)?))
        .with(PluginField::int32s("out_size", to_i32(out_size)?))
        .with(PluginField::chars("mode", rule.interpolation_name()))
        .with(PluginField::int32("align_corners", 0));
    let plugin = ctx.create_plugin(INTERPOLATE_PLUGIN, &rule.plugin_instance_name(), &fields)?;
    Ok(ctx.network_mut().add_plugin(&[input], plugin.as_ref())?)
}

fn to_i32(dims: &[i64]) -> LowerResult<Vec<i32>> {
    dims.iter()
        .map(|dim| {
            i32::try_from(*dim).map_err(|_| {
                ErrorKind::UnsupportedCapabilityCombination(format!(
                    "extent {} does not fit a 32-bit plugin field",
                    dim
                ))
            })
        })
        .collect()
}
