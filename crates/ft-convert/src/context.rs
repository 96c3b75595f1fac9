use crate::config::ConversionSettings;
use crate::error::{ErrorKind, LowerResult};
use ft_backend::{
    BackendCapabilities, DataType, Dims, Network, Plugin, PluginFieldCollection, PluginRegistry,
    TensorId, Weights,
};
use ft_core::{ConstTensor, IValue, ScalarType, ValueId};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Mutable state of one conversion pass.
///
/// Owns the network under construction and the bindings from IR values to
/// backend tensors or evaluated constants. Bindings are append-only: a value
/// is bound at most once. The plugin registry is shared and read-only.
#[derive(Debug)]
pub struct ConversionCtx<'a> {
    network: Network,
    plugins: &'a PluginRegistry,
    settings: ConversionSettings,
    value_tensor_map: HashMap<ValueId, TensorId>,
    evaluated_value_map: HashMap<ValueId, IValue>,
}

impl<'a> ConversionCtx<'a> {
    pub fn new(plugins: &'a PluginRegistry, settings: ConversionSettings) -> Self {
        Self {
            network: Network::new(),
            plugins,
            settings,
            value_tensor_map: HashMap::new(),
            evaluated_value_map: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> &BackendCapabilities {
        &self.settings.capabilities
    }

    pub fn input_is_dynamic(&self) -> bool {
        self.settings.dynamic_shapes
    }

    pub fn plugins(&self) -> &PluginRegistry {
        self.plugins
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    /// Declares a network input and binds it to `value`.
    pub fn add_input(
        &mut self,
        value: ValueId,
        name: &str,
        dtype: ScalarType,
        dims: &[i64],
    ) -> LowerResult<TensorId> {
        self.ensure_unbound(value)?;
        let tensor = self
            .network
            .add_input(name, DataType::from_scalar_type(dtype), Dims::new(dims));
        debug!("Adding input {} as {}{}", name, tensor, Dims::new(dims));
        self.associate_value_and_tensor(value, tensor)
    }

    pub fn associate_value_and_tensor(
        &mut self,
        value: ValueId,
        tensor: TensorId,
    ) -> LowerResult<TensorId> {
        self.ensure_unbound(value)?;
        trace!("binding {} to {}", value, tensor);
        self.value_tensor_map.insert(value, tensor);
        Ok(tensor)
    }

    pub fn associate_value_and_ivalue(&mut self, value: ValueId, ivalue: IValue) -> LowerResult<()> {
        self.ensure_unbound(value)?;
        trace!("binding {} to constant {}", value, ivalue);
        self.evaluated_value_map.insert(value, ivalue);
        Ok(())
    }

    pub fn tensor_for(&self, value: ValueId) -> Option<TensorId> {
        self.value_tensor_map.get(&value).copied()
    }

    pub fn evaluated(&self, value: ValueId) -> Option<&IValue> {
        self.evaluated_value_map.get(&value)
    }

    pub fn is_bound(&self, value: ValueId) -> bool {
        self.value_tensor_map.contains_key(&value) || self.evaluated_value_map.contains_key(&value)
    }

    /// Materializes a constant tensor as a constant layer.
    pub fn tensor_to_const(&mut self, tensor: &ConstTensor) -> LowerResult<TensorId> {
        let weights = Weights {
            dtype: DataType::from_scalar_type(tensor.dtype()),
            dims: Dims::new(tensor.shape()),
            values: tensor.data().clone(),
        };
        Ok(self.network.add_constant(weights)?.output)
    }

    pub fn create_plugin(
        &self,
        name: &str,
        instance_name: &str,
        fields: &PluginFieldCollection,
    ) -> LowerResult<Box<dyn Plugin>> {
        Ok(self.plugins.create_plugin(name, instance_name, fields)?)
    }

    fn ensure_unbound(&self, value: ValueId) -> LowerResult<()> {
        if self.is_bound(value) {
            return Err(ErrorKind::AlreadyBound(value));
        }
        Ok(())
    }
}
