use crate::dims::Dims;
use crate::dtype::DataType;
use crate::plugin::PluginFieldCollection;
use ft_core::TensorData;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::{Display as StrumDisplay, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TensorId(pub u32);

impl Display for TensorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u32);

impl Display for LayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Constant payload of a `Constant` layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weights {
    pub dtype: DataType,
    pub dims: Dims,
    pub values: TensorData,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum ElementWiseOperation {
    Sum,
    Prod,
    Sub,
    Div,
    Max,
    Min,
}

impl ElementWiseOperation {
    pub fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            ElementWiseOperation::Sum => lhs.checked_add(rhs),
            ElementWiseOperation::Prod => lhs.checked_mul(rhs),
            ElementWiseOperation::Sub => lhs.checked_sub(rhs),
            ElementWiseOperation::Div => lhs.checked_div(rhs),
            ElementWiseOperation::Max => Some(lhs.max(rhs)),
            ElementWiseOperation::Min => Some(lhs.min(rhs)),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    Nearest,
    Linear,
}

/// How a resize layer learns its output extents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResizeOutput {
    /// Per-dimension scale factors, one per input dimension.
    Scales(Vec<f32>),
    /// Literal output shape.
    Shape(Dims),
    /// Output shape read from the layer's second input at run time.
    ShapeTensor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizeLayer {
    pub mode: ResizeMode,
    pub align_corners: bool,
    pub output: ResizeOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShuffleLayer {
    pub reshape_dims: Dims,
}

/// Fused group normalization over the channel axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationLayer {
    pub num_groups: i64,
    pub epsilon: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginLayer {
    pub plugin_type: String,
    pub plugin_version: String,
    pub instance_name: String,
    pub fields: PluginFieldCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LayerKind {
    Constant(Weights),
    Shape,
    ElementWise(ElementWiseOperation),
    Shuffle(ShuffleLayer),
    Resize(ResizeLayer),
    Normalization(NormalizationLayer),
    Plugin(PluginLayer),
}

impl LayerKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Constant(_) => "Constant",
            LayerKind::Shape => "Shape",
            LayerKind::ElementWise(_) => "ElementWise",
            LayerKind::Shuffle(_) => "Shuffle",
            LayerKind::Resize(_) => "Resize",
            LayerKind::Normalization(_) => "Normalization",
            LayerKind::Plugin(_) => "PluginV2",
        }
    }
}

/// A node of the backend network. Everything but the debug name is fixed
/// once the layer has been added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    pub(crate) kind: LayerKind,
    pub(crate) inputs: Vec<TensorId>,
    pub(crate) outputs: Vec<TensorId>,
}

impl Layer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<TensorId> {
        self.outputs.get(index).copied()
    }

    pub fn as_resize(&self) -> Option<&ResizeLayer> {
        match &self.kind {
            LayerKind::Resize(resize) => Some(resize),
            _ => None,
        }
    }

    pub fn as_plugin(&self) -> Option<&PluginLayer> {
        match &self.kind {
            LayerKind::Plugin(plugin) => Some(plugin),
            _ => None,
        }
    }

    /// Equal in configuration and wiring; ids and names are ignored.
    pub fn structurally_eq(&self, other: &Layer) -> bool {
        self.kind == other.kind
            && self.inputs == other.inputs
            && self.outputs.len() == other.outputs.len()
    }
}
