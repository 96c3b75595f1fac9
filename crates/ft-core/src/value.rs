use crate::dtype::ScalarType;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValueError {
    #[error("shape {0:?} has a negative or unknown dimension")]
    UnknownDimension(Vec<i64>),
    #[error("shape {0:?} holds more elements than can be addressed")]
    TooLarge(Vec<i64>),
    #[error("tensor data holds {found} elements, shape requires {expected}")]
    DataLength { expected: usize, found: usize },
    #[error("tensor data does not match element type {0}")]
    DataKind(ScalarType),
}

/// Flat element storage of a constant tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TensorData {
    Float(Vec<f32>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            TensorData::Float(values) => values.len(),
            TensorData::Int(values) => values.len(),
            TensorData::Bool(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fits(&self, dtype: ScalarType) -> bool {
        match self {
            TensorData::Float(_) => dtype.is_floating_point(),
            TensorData::Int(_) => matches!(
                dtype,
                ScalarType::Int64 | ScalarType::Int32 | ScalarType::Int8
            ),
            TensorData::Bool(_) => dtype == ScalarType::Bool,
        }
    }
}

/// A dense constant tensor known at conversion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstTensor {
    dtype: ScalarType,
    shape: Vec<i64>,
    data: TensorData,
}

impl ConstTensor {
    pub fn new(dtype: ScalarType, shape: Vec<i64>, data: TensorData) -> Result<Self, ValueError> {
        let expected = numel(&shape)?;
        if !data.fits(dtype) {
            return Err(ValueError::DataKind(dtype));
        }
        if data.len() != expected {
            return Err(ValueError::DataLength {
                expected,
                found: data.len(),
            });
        }
        Ok(Self { dtype, shape, data })
    }

    /// Tensor of `shape` where every element equals `value` converted to `dtype`.
    pub fn full(shape: &[i64], value: f64, dtype: ScalarType) -> Result<Self, ValueError> {
        let count = numel(shape)?;
        let data = if dtype.is_floating_point() {
            TensorData::Float(vec![value as f32; count])
        } else if dtype == ScalarType::Bool {
            TensorData::Bool(vec![value != 0.0; count])
        } else {
            TensorData::Int(vec![value as i64; count])
        };
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            data,
        })
    }

    pub fn ones(shape: &[i64], dtype: ScalarType) -> Result<Self, ValueError> {
        Self::full(shape, 1.0, dtype)
    }

    pub fn zeros(shape: &[i64], dtype: ScalarType) -> Result<Self, ValueError> {
        Self::full(shape, 0.0, dtype)
    }

    /// One-dimensional int32 tensor, the form shape tensors take in the backend.
    /// Values are stored unchanged; the backend refuses any that do not fit.
    pub fn int32_vector(values: &[i64]) -> Self {
        Self {
            dtype: ScalarType::Int32,
            shape: vec![values.len() as i64],
            data: TensorData::Int(values.to_vec()),
        }
    }

    pub fn dtype(&self) -> ScalarType {
        self.dtype
    }

    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }
}

fn numel(shape: &[i64]) -> Result<usize, ValueError> {
    if shape.iter().any(|dim| *dim < 0) {
        return Err(ValueError::UnknownDimension(shape.to_vec()));
    }
    shape
        .iter()
        .try_fold(1usize, |count, dim| count.checked_mul(*dim as usize))
        .ok_or_else(|| ValueError::TooLarge(shape.to_vec()))
}

/// A compile-time value flowing into a node: a literal argument or the
/// result of evaluating an IR constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IValue {
    None,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    IntList(Vec<i64>),
    DoubleList(Vec<f64>),
    Tensor(ConstTensor),
}

impl IValue {
    pub fn is_none(&self) -> bool {
        matches!(self, IValue::None)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            IValue::None => "None",
            IValue::Bool(_) => "bool",
            IValue::Int(_) => "int",
            IValue::Double(_) => "float",
            IValue::Str(_) => "str",
            IValue::IntList(_) => "int[]",
            IValue::DoubleList(_) => "float[]",
            IValue::Tensor(_) => "Tensor",
        }
    }
}

impl Display for IValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IValue::None => write!(f, "None"),
            IValue::Bool(true) => write!(f, "True"),
            IValue::Bool(false) => write!(f, "False"),
            IValue::Int(value) => write!(f, "{}", value),
            IValue::Double(value) => write!(f, "{:?}", value),
            IValue::Str(value) => write!(f, "\"{}\"", value),
            IValue::IntList(values) => write!(f, "[{}]", values.iter().join(", ")),
            IValue::DoubleList(values) => {
                write!(f, "[{}]", values.iter().map(|v| format!("{:?}", v)).join(", "))
            }
            IValue::Tensor(tensor) => write!(
                f,
                "Tensor({}[{}])",
                tensor.dtype(),
                tensor.shape().iter().join(", ")
            ),
        }
    }
}

impl From<bool> for IValue {
    fn from(value: bool) -> Self {
        IValue::Bool(value)
    }
}

impl From<i64> for IValue {
    fn from(value: i64) -> Self {
        IValue::Int(value)
    }
}

impl From<f64> for IValue {
    fn from(value: f64) -> Self {
        IValue::Double(value)
    }
}

impl From<Vec<i64>> for IValue {
    fn from(value: Vec<i64>) -> Self {
        IValue::IntList(value)
    }
}

impl From<Vec<f64>> for IValue {
    fn from(value: Vec<f64>) -> Self {
        IValue::DoubleList(value)
    }
}

impl From<ConstTensor> for IValue {
    fn from(value: ConstTensor) -> Self {
        IValue::Tensor(value)
    }
}
