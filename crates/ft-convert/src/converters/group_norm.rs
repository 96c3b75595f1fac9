use super::single_output;
use crate::args::Args;
use crate::context::ConversionCtx;
use crate::error::{ErrorKind, LowerResult};
use crate::gate::{pad_to_rank, select_group_norm_strategy, GroupNormStrategy};
use ft_backend::{NormalizationLayer, PluginField, PluginFieldCollection, GROUP_NORM_PLUGIN};
use ft_core::{ConstTensor, Node};
use tracing::debug;

const DEFAULT_EPS: f64 = 1e-5;

/// The plugin only accepts inputs of at least this rank.
const PLUGIN_MIN_RANK: usize = 4;

pub(crate) fn convert(ctx: &mut ConversionCtx<'_>, node: &Node, args: &Args) -> LowerResult<bool> {
    let output = single_output(node)?;
    let input = args.required("input")?.as_tensor(ctx)?;
    let desc = ctx.network().tensor(input)?.clone();
    let dtype = desc.dtype.to_scalar_type();
    debug!("Input tensor type: {}", dtype);

    let num_groups = args.required("num_groups")?.as_int()?;
    if num_groups <= 0 {
        return Err(ErrorKind::TypeMismatch {
            param: "num_groups".to_string(),
            expected: "a positive int".to_string(),
            found: num_groups.to_string(),
        });
    }
    let shape = desc.dims.to_vec();
    let scale = args
        .required("weight")?
        .as_tensor_or(ctx, || ConstTensor::ones(&shape, dtype))?;
    let shift = args
        .required("bias")?
        .as_tensor_or(ctx, || ConstTensor::zeros(&shape, dtype))?;
    let eps = args.required("eps")?.as_double_or(DEFAULT_EPS)? as f32;

    let layer = match select_group_norm_strategy(ctx.capabilities()) {
        GroupNormStrategy::Native => ctx.network_mut().add_normalization(
            input,
            scale,
            shift,
            NormalizationLayer {
                num_groups,
                epsilon: eps,
            },
        )?,
        GroupNormStrategy::Plugin => {
            // The padded rank is not reshaped back; the output keeps rank 4.
            let input = pad_to_rank(ctx, input, PLUGIN_MIN_RANK)?;
            let groups = i32::try_from(num_groups).map_err(|_| ErrorKind::TypeMismatch {
                param: "num_groups".to_string(),
                expected: "a 32-bit int".to_string(),
                found: num_groups.to_string(),
            })?;
            let fields = PluginFieldCollection::new()
                .with(PluginField::float32("eps", eps))
                .with(PluginField::int32("num_groups", groups));
            let plugin = ctx.create_plugin(GROUP_NORM_PLUGIN, "gnorm", &fields)?;
            ctx.network_mut()
                .add_plugin(&[input, scale, shift], plugin.as_ref())?
        }
    };

    ctx.network_mut().set_layer_name(layer.layer, node.to_string())?;
    ctx.associate_value_and_tensor(output, layer.output)?;
    debug!("Output tensor shape: {}", ctx.network().tensor(layer.output)?.dims);
    Ok(true)
}
