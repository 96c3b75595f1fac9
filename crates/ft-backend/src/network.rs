use crate::dims::Dims;
use crate::dtype::DataType;
use crate::layer::{
    ElementWiseOperation, Layer, LayerId, LayerKind, NormalizationLayer, PluginLayer,
    ResizeLayer, ResizeOutput, ShuffleLayer, TensorId, Weights,
};
use crate::plugin::{Plugin, PluginError};
use ft_core::TensorData;
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("tensor {0} does not exist in the network")]
    UnknownTensor(TensorId),
    #[error("layer {0} does not exist in the network")]
    UnknownLayer(LayerId),
    #[error("tensor {0} is already marked as a network output")]
    DuplicateOutput(TensorId),
    #[error("cannot broadcast {lhs} against {rhs}")]
    Broadcast { lhs: Dims, rhs: Dims },
    #[error("resize of a rank-{rank} tensor got {found} output extents or scales")]
    ResizeRank { rank: usize, found: usize },
    #[error("resize shape input {0} must be a 1-D int32 tensor holding one extent per dimension")]
    ShapeInput(TensorId),
    #[error("cannot reshape {from} into {to}")]
    Reshape { from: Dims, to: Dims },
    #[error("constant weights hold {found} values, dims {dims} require {expected}")]
    Weights {
        dims: Dims,
        expected: i64,
        found: usize,
    },
    #[error("constant value {value} does not fit {dtype}")]
    OutOfRange { dtype: DataType, value: i64 },
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TensorDesc {
    pub name: String,
    pub dtype: DataType,
    pub dims: Dims,
}

/// Handle to a freshly added single-output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRef {
    pub layer: LayerId,
    pub output: TensorId,
}

/// The backend graph under construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Network {
    tensors: Vec<TensorDesc>,
    layers: Vec<Layer>,
    inputs: Vec<TensorId>,
    outputs: Vec<TensorId>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, name: impl Into<String>, dtype: DataType, dims: Dims) -> TensorId {
        let id = self.push_tensor(name.into(), dtype, dims);
        self.inputs.push(id);
        id
    }

    pub fn mark_output(&mut self, tensor: TensorId) -> Result<()> {
        self.tensor(tensor)?;
        if self.outputs.contains(&tensor) {
            return Err(NetworkError::DuplicateOutput(tensor));
        }
        self.outputs.push(tensor);
        Ok(())
    }

    pub fn add_constant(&mut self, weights: Weights) -> Result<LayerRef> {
        let expected = weights.dims.volume().unwrap_or(-1);
        if expected != weights.values.len() as i64 {
            return Err(NetworkError::Weights {
                dims: weights.dims.clone(),
                expected,
                found: weights.values.len(),
            });
        }
        if let TensorData::Int(values) = &weights.values {
            if let Some(value) = values.iter().find(|value| !weights.dtype.holds(**value)) {
                return Err(NetworkError::OutOfRange {
                    dtype: weights.dtype,
                    value: *value,
                });
            }
        }
        let out = (weights.dtype, weights.dims.clone());
        self.push_layer(LayerKind::Constant(weights), vec![], out)
    }

    /// Run-time shape query: a 1-D int32 tensor holding the extents of `input`.
    pub fn add_shape(&mut self, input: TensorId) -> Result<LayerRef> {
        let rank = self.tensor(input)?.dims.rank() as i64;
        self.push_layer(
            LayerKind::Shape,
            vec![input],
            (DataType::Int32, Dims::new([rank])),
        )
    }

    pub fn add_elementwise(
        &mut self,
        lhs: TensorId,
        rhs: TensorId,
        op: ElementWiseOperation,
    ) -> Result<LayerRef> {
        let lhs_desc = self.tensor(lhs)?;
        let rhs_desc = self.tensor(rhs)?;
        let dims = broadcast(&lhs_desc.dims, &rhs_desc.dims)?;
        let dtype = lhs_desc.dtype;
        self.push_layer(LayerKind::ElementWise(op), vec![lhs, rhs], (dtype, dims))
    }

    pub fn add_shuffle(&mut self, input: TensorId, shuffle: ShuffleLayer) -> Result<LayerRef> {
        let desc = self.tensor(input)?;
        let from = desc.dims.clone();
        let to = shuffle.reshape_dims.clone();
        let mismatched = from.volume().is_none() || from.volume() != to.volume();
        if from.is_static() && to.is_static() && mismatched {
            return Err(NetworkError::Reshape { from, to });
        }
        let dtype = desc.dtype;
        self.push_layer(LayerKind::Shuffle(shuffle), vec![input], (dtype, to))
    }

    /// Adds a resize layer. `shape` is the run-time shape input and is
    /// required exactly when the layer is configured with
    /// [`ResizeOutput::ShapeTensor`].
    pub fn add_resize(
        &mut self,
        input: TensorId,
        resize: ResizeLayer,
        shape: Option<TensorId>,
    ) -> Result<LayerRef> {
        let desc = self.tensor(input)?;
        let rank = desc.dims.rank();
        let dtype = desc.dtype;
        let (inputs, dims) = match (&resize.output, shape) {
            (ResizeOutput::Scales(scales), None) => {
                if scales.len() != rank {
                    return Err(NetworkError::ResizeRank {
                        rank,
                        found: scales.len(),
                    });
                }
                let dims = desc
                    .dims
                    .as_slice()
                    .iter()
                    .zip(scales)
                    .map(|(dim, scale)| {
                        if *dim < 0 {
                            -1
                        } else {
                            (*dim as f64 * *scale as f64).floor() as i64
                        }
                    })
                    .collect::<Vec<_>>();
                (vec![input], Dims(dims))
            }
            (ResizeOutput::Shape(dims), None) => {
                if dims.rank() != rank {
                    return Err(NetworkError::ResizeRank {
                        rank,
                        found: dims.rank(),
                    });
                }
                (vec![input], dims.clone())
            }
            (ResizeOutput::ShapeTensor, Some(shape)) => {
                let shape_desc = self.tensor(shape)?;
                if shape_desc.dtype != DataType::Int32
                    || shape_desc.dims.as_slice() != [rank as i64]
                {
                    return Err(NetworkError::ShapeInput(shape));
                }
                let dims = self
                    .shape_values(shape, &HashMap::new())
                    .map(|values| values.into_iter().map(|v| v.unwrap_or(-1)).collect())
                    .unwrap_or_else(|| vec![-1; rank]);
                (vec![input, shape], Dims(dims))
            }
            (ResizeOutput::ShapeTensor, None) => return Err(NetworkError::ShapeInput(input)),
            (_, Some(shape)) => return Err(NetworkError::ShapeInput(shape)),
        };
        self.push_layer(LayerKind::Resize(resize), inputs, (dtype, dims))
    }

    pub fn add_normalization(
        &mut self,
        input: TensorId,
        scale: TensorId,
        bias: TensorId,
        normalization: NormalizationLayer,
    ) -> Result<LayerRef> {
        let desc = self.tensor(input)?;
        let out = (desc.dtype, desc.dims.clone());
        self.tensor(scale)?;
        self.tensor(bias)?;
        self.push_layer(
            LayerKind::Normalization(normalization),
            vec![input, scale, bias],
            out,
        )
    }

    pub fn add_plugin(&mut self, inputs: &[TensorId], plugin: &dyn Plugin) -> Result<LayerRef> {
        let mut input_dims = Vec::with_capacity(inputs.len());
        for input in inputs {
            input_dims.push(self.tensor(*input)?.dims.clone());
        }
        let dims = plugin.output_dims(&input_dims)?;
        let dtype = match inputs.first() {
            Some(first) => self.tensor(*first)?.dtype,
            None => DataType::Float,
        };
        let layer = PluginLayer {
            plugin_type: plugin.plugin_type().to_string(),
            plugin_version: plugin.plugin_version().to_string(),
            instance_name: plugin.instance_name().to_string(),
            fields: plugin.fields().clone(),
        };
        self.push_layer(LayerKind::Plugin(layer), inputs.to_vec(), (dtype, dims))
    }

    pub fn set_layer_name(&mut self, layer: LayerId, name: impl Into<String>) -> Result<()> {
        let layer = self
            .layers
            .get_mut(layer.0 as usize)
            .ok_or(NetworkError::UnknownLayer(layer))?;
        layer.name = name.into();
        Ok(())
    }

    pub fn tensor(&self, id: TensorId) -> Result<&TensorDesc> {
        self.tensors
            .get(id.0 as usize)
            .ok_or(NetworkError::UnknownTensor(id))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0 as usize)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn tensors(&self) -> impl Iterator<Item = (TensorId, &TensorDesc)> {
        self.tensors
            .iter()
            .enumerate()
            .map(|(idx, desc)| (TensorId(idx as u32), desc))
    }

    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    /// The layer that produces `tensor`, if it is not a network input.
    pub fn producer(&self, tensor: TensorId) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|layer| layer.outputs.contains(&tensor))
    }

    /// Folds a shape sub-graph built from constants, shape queries and
    /// element-wise integer arithmetic. `bindings` supplies concrete extents
    /// for tensors whose dims are only known at run time. Entries that cannot
    /// be determined are `None`; a zero factor determines a product even when
    /// the other side is unknown.
    pub fn shape_values(
        &self,
        tensor: TensorId,
        bindings: &HashMap<TensorId, Vec<i64>>,
    ) -> Option<Vec<Option<i64>>> {
        let layer = self.producer(tensor)?;
        match &layer.kind {
            LayerKind::Constant(weights) => match &weights.values {
                TensorData::Int(values) => Some(values.iter().map(|v| Some(*v)).collect()),
                _ => None,
            },
            LayerKind::Shape => {
                let source = layer.inputs[0];
                if let Some(dims) = bindings.get(&source) {
                    return Some(dims.iter().map(|v| Some(*v)).collect());
                }
                let desc = self.tensor(source).ok()?;
                Some(
                    desc.dims
                        .as_slice()
                        .iter()
                        .map(|dim| (*dim >= 0).then_some(*dim))
                        .collect(),
                )
            }
            LayerKind::ElementWise(op) => {
                let lhs = self.shape_values(layer.inputs[0], bindings)?;
                let rhs = self.shape_values(layer.inputs[1], bindings)?;
                if lhs.len() != rhs.len() {
                    return None;
                }
                Some(
                    lhs.into_iter()
                        .zip(rhs)
                        .map(|(a, b)| match (op, a, b) {
                            (ElementWiseOperation::Prod, Some(0), _)
                            | (ElementWiseOperation::Prod, _, Some(0)) => Some(0),
                            (_, Some(a), Some(b)) => op.apply(a, b),
                            _ => None,
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }

    fn push_tensor(&mut self, name: String, dtype: DataType, dims: Dims) -> TensorId {
        let id = TensorId(self.tensors.len() as u32);
        self.tensors.push(TensorDesc { name, dtype, dims });
        id
    }

    fn push_layer(
        &mut self,
        kind: LayerKind,
        inputs: Vec<TensorId>,
        (dtype, dims): (DataType, Dims),
    ) -> Result<LayerRef> {
        for input in &inputs {
            self.tensor(*input)?;
        }
        let id = LayerId(self.layers.len() as u32);
        let name = format!("(Unnamed Layer* {}) [{}]", id.0, kind.type_name());
        let output = self.push_tensor(format!("{}_output", name), dtype, dims);
        trace!("adding {} {} with inputs {:?}", id, kind.type_name(), inputs);
        self.layers.push(Layer {
            id,
            name,
            kind,
            inputs,
            outputs: vec![output],
        });
        Ok(LayerRef { layer: id, output })
    }
}

fn broadcast(lhs: &Dims, rhs: &Dims) -> Result<Dims> {
    let error = || NetworkError::Broadcast {
        lhs: lhs.clone(),
        rhs: rhs.clone(),
    };
    if lhs.rank() != rhs.rank() {
        return Err(error());
    }
    lhs.as_slice()
        .iter()
        .zip(rhs.as_slice())
        .map(|(a, b)| match (*a, *b) {
            (a, b) if a == b => Ok(a),
            (1, b) => Ok(b),
            (a, 1) => Ok(a),
            (-1, _) | (_, -1) => Ok(-1),
            _ => Err(error()),
        })
        .collect::<Result<Vec<_>>>()
        .map(Dims)
}

impl Network {
    /// JSON snapshot of the network, for debugging converted graphs.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
