//! Target-side model of a hardware tensor backend: a network definition made
//! of immutable layers, compute plugins, and the capability descriptor that
//! tells converters which layer configurations the backend can run.

pub mod capability;
pub mod dims;
pub mod dtype;
pub mod layer;
pub mod network;
pub mod plugin;
pub mod pretty;

pub use capability::{BackendCapabilities, BackendVersion, CapabilityError};
pub use dims::Dims;
pub use dtype::DataType;
pub use layer::{
    ElementWiseOperation, Layer, LayerId, LayerKind, NormalizationLayer, PluginLayer,
    ResizeLayer, ResizeMode, ResizeOutput, ShuffleLayer, TensorId, Weights,
};
pub use network::{LayerRef, Network, NetworkError, TensorDesc};
pub use plugin::{
    Plugin, PluginCreator, PluginError, PluginField, PluginFieldCollection, PluginFieldData,
    PluginFieldType, PluginRegistry, GROUP_NORM_PLUGIN, INTERPOLATE_PLUGIN,
};
