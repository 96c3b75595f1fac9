use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Element type of IR tensors and constant tensors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarType {
    Float32,
    Float16,
    Int64,
    Int32,
    Int8,
    Bool,
}

impl ScalarType {
    pub fn is_floating_point(self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float16)
    }
}
