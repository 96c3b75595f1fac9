use ft_core::ScalarType;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Element types the backend can hold in a tensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    Float,
    Half,
    Int8,
    Int32,
    Bool,
}

impl DataType {
    /// The backend has no 64-bit integers; longs are narrowed to int32 and
    /// out-of-range constants are refused when added to a network.
    pub fn from_scalar_type(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Float32 => DataType::Float,
            ScalarType::Float16 => DataType::Half,
            ScalarType::Int64 | ScalarType::Int32 => DataType::Int32,
            ScalarType::Int8 => DataType::Int8,
            ScalarType::Bool => DataType::Bool,
        }
    }

    /// Whether an integer constant is representable without truncation.
    pub fn holds(self, value: i64) -> bool {
        match self {
            DataType::Int32 => i32::try_from(value).is_ok(),
            DataType::Int8 => i8::try_from(value).is_ok(),
            DataType::Bool => value == 0 || value == 1,
            DataType::Float | DataType::Half => true,
        }
    }

    pub fn to_scalar_type(self) -> ScalarType {
        match self {
            DataType::Float => ScalarType::Float32,
            DataType::Half => ScalarType::Float16,
            DataType::Int8 => ScalarType::Int8,
            DataType::Int32 => ScalarType::Int32,
            DataType::Bool => ScalarType::Bool,
        }
    }
}
