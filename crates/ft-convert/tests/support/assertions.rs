use ft_backend::{
    Dims, Layer, LayerKind, Network, PluginFieldData, PluginLayer, ResizeLayer, TensorId,
};
use ft_core::TensorData;

pub fn layer_types(network: &Network) -> Vec<&'static str> {
    network
        .layers()
        .iter()
        .map(|layer| layer.kind().type_name())
        .collect()
}

pub fn last_layer(network: &Network) -> &Layer {
    network.layers().last().expect("network has layers")
}

pub fn resize(network: &Network) -> &ResizeLayer {
    last_layer(network)
        .as_resize()
        .unwrap_or_else(|| panic!("expected a resize layer, got {:?}", last_layer(network).kind()))
}

pub fn plugin(network: &Network) -> &PluginLayer {
    last_layer(network)
        .as_plugin()
        .unwrap_or_else(|| panic!("expected a plugin layer, got {:?}", last_layer(network).kind()))
}

pub fn output_dims(network: &Network) -> Dims {
    let output = network.outputs()[0];
    network.tensor(output).expect("output tensor").dims.clone()
}

pub fn int_field(plugin: &PluginLayer, name: &str) -> Vec<i32> {
    match &plugin.fields.get(name).expect("field present").data {
        PluginFieldData::Int32(values) => values.clone(),
        other => panic!("field {} is not int32: {:?}", name, other),
    }
}

pub fn float_field(plugin: &PluginLayer, name: &str) -> Vec<f32> {
    match &plugin.fields.get(name).expect("field present").data {
        PluginFieldData::Float32(values) => values.clone(),
        other => panic!("field {} is not float32: {:?}", name, other),
    }
}

pub fn char_field(plugin: &PluginLayer, name: &str) -> String {
    match &plugin.fields.get(name).expect("field present").data {
        PluginFieldData::Char(value) => value.clone(),
        other => panic!("field {} is not char: {:?}", name, other),
    }
}

/// Values held by the constant layer producing `tensor`.
pub fn constant_values(network: &Network, tensor: TensorId) -> TensorData {
    match network.producer(tensor).map(|layer| layer.kind()) {
        Some(LayerKind::Constant(weights)) => weights.values.clone(),
        other => panic!("{} is not produced by a constant: {:?}", tensor, other),
    }
}
