//! Lowers IR operator nodes into backend network layers.
//!
//! A [`ConverterRegistry`] maps operator signatures to lowering rules. For
//! each node, [`convert_node`] resolves the rule, binds the node's arguments
//! against the signature, and lets the rule append layers to the network held
//! by the [`ConversionCtx`]. [`convert_graph`] drives a whole graph.

pub mod args;
pub mod config;
pub mod context;
pub mod converters;
pub mod error;
pub mod gate;
pub mod registry;
pub mod rule;
pub mod shape;

pub use args::{Arg, ArgValue, Args};
pub use config::{ConfigError, ConversionSettings};
pub use context::ConversionCtx;
pub use error::{ConversionError, ErrorKind, LowerResult};
pub use registry::{ConverterRegistry, Registration, RegistryBuilder, RegistryError};
pub use rule::{ConverterFn, LoweringRule, ResizeRule};
pub use shape::ShapeMask;

use ft_backend::{Network, PluginRegistry};
use ft_core::{Graph, Node, ValueKind};
use tracing::{debug, info};

/// Converts a single node, appending its layers to `ctx`.
///
/// On failure the context is left partially populated and should be
/// discarded.
pub fn convert_node(
    ctx: &mut ConversionCtx<'_>,
    registry: &ConverterRegistry,
    node: &Node,
) -> error::Result<()> {
    let wrap = |kind| ConversionError::new(node, kind);
    let registration = registry.resolve(node).map_err(wrap)?;
    debug!("Converting {} with {}", node, registration.signature);
    let args = Args::resolve(ctx, &registration.signature, node).map_err(wrap)?;
    if !registration.rule.apply(ctx, node, &args).map_err(wrap)? {
        return Err(wrap(ErrorKind::ConverterFailed));
    }
    if let Some(output) = node.outputs().iter().find(|output| !ctx.is_bound(**output)) {
        return Err(wrap(ErrorKind::UnboundOutput(*output)));
    }
    Ok(())
}

/// Converts every node of `graph` into a fresh network.
pub fn convert_graph(
    graph: &Graph,
    registry: &ConverterRegistry,
    plugins: &PluginRegistry,
    settings: ConversionSettings,
) -> error::Result<Network> {
    info!(
        "Converting graph with {} nodes for backend {} (dynamic shapes: {})",
        graph.nodes().len(),
        settings.capabilities.version,
        settings.dynamic_shapes
    );
    let mut ctx = ConversionCtx::new(plugins, settings);

    for value in graph.values() {
        let bound = match &value.kind {
            ValueKind::Input { dtype, dims } => {
                let name = value
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("input_{}", value.id.0));
                ctx.add_input(value.id, &name, *dtype, dims).map(|_| ())
            }
            ValueKind::Constant(constant) => {
                ctx.associate_value_and_ivalue(value.id, constant.clone())
            }
            ValueKind::NodeOutput { .. } => Ok(()),
        };
        bound.map_err(|kind| ConversionError::for_value(value.id, kind))?;
    }

    for node in graph.nodes() {
        convert_node(&mut ctx, registry, node)?;
    }

    for output in graph.outputs() {
        let tensor = ctx
            .tensor_for(*output)
            .ok_or(ErrorKind::UnboundValue(*output))
            .map_err(|kind| ConversionError::for_value(*output, kind))?;
        ctx.network_mut()
            .mark_output(tensor)
            .map_err(|err| ConversionError::for_value(*output, err.into()))?;
    }

    Ok(ctx.into_network())
}
