use std::fmt::{self, Display, Formatter};

use itertools::Itertools;

use crate::layer::{Layer, LayerKind, ResizeOutput};
use crate::network::Network;
use crate::plugin::PluginFieldData;

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "network {{")?;
        if !self.inputs().is_empty() {
            writeln!(f, "  inputs:")?;
            for input in self.inputs() {
                let desc = self.tensor(*input).map_err(|_| fmt::Error)?;
                writeln!(
                    f,
                    "    {}: {}{} \"{}\"",
                    input, desc.dtype, desc.dims, desc.name
                )?;
            }
        }
        if !self.layers().is_empty() {
            writeln!(f, "  layers:")?;
            for layer in self.layers() {
                write_layer(self, layer, f)?;
            }
        }
        if !self.outputs().is_empty() {
            writeln!(f, "  outputs: {}", self.outputs().iter().join(", "))?;
        }
        write!(f, "}}")
    }
}

fn write_layer(network: &Network, layer: &Layer, f: &mut Formatter<'_>) -> fmt::Result {
    let outputs = layer
        .outputs()
        .iter()
        .map(|id| match network.tensor(*id) {
            Ok(desc) => format!("{}: {}{}", id, desc.dtype, desc.dims),
            Err(_) => id.to_string(),
        })
        .join(", ");
    writeln!(
        f,
        "    {} = {}({}) {}  # {}",
        outputs,
        layer.kind().type_name(),
        layer.inputs().iter().join(", "),
        format_params(layer.kind()),
        layer.name()
    )
}

fn format_params(kind: &LayerKind) -> String {
    match kind {
        LayerKind::Constant(weights) => format!("{{{}{}}}", weights.dtype, weights.dims),
        LayerKind::Shape => String::new(),
        LayerKind::ElementWise(op) => format!("{{op: {}}}", op),
        LayerKind::Shuffle(shuffle) => format!("{{reshape: {}}}", shuffle.reshape_dims),
        LayerKind::Resize(resize) => {
            let output = match &resize.output {
                ResizeOutput::Scales(scales) => {
                    format!("scales: [{}]", scales.iter().map(|s| format!("{:?}", s)).join(", "))
                }
                ResizeOutput::Shape(dims) => format!("shape: {}", dims),
                ResizeOutput::ShapeTensor => "shape: <input 1>".to_string(),
            };
            format!(
                "{{mode: {}, align_corners: {}, {}}}",
                resize.mode, resize.align_corners, output
            )
        }
        LayerKind::Normalization(norm) => {
            format!("{{num_groups: {}, eps: {:?}}}", norm.num_groups, norm.epsilon)
        }
        LayerKind::Plugin(plugin) => {
            let fields = plugin
                .fields
                .iter()
                .map(|field| {
                    let value = match &field.data {
                        PluginFieldData::Float32(values) => {
                            values.iter().map(|v| format!("{:?}", v)).join(", ")
                        }
                        PluginFieldData::Int32(values) => values.iter().join(", "),
                        PluginFieldData::Char(value) => format!("\"{}\"", value),
                    };
                    format!("{}: {}[{}]", field.name, field.data.field_type(), value)
                })
                .join(", ");
            format!(
                "{{{} v{} \"{}\", {}}}",
                plugin.plugin_type, plugin.plugin_version, plugin.instance_name, fields
            )
        }
    }
}
