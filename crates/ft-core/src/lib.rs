//! Source-side vocabulary of the lowering engine: IR graphs and nodes,
//! constant values, and the operator-signature grammar used to key converters.

pub mod dtype;
pub mod graph;
pub mod signature;
pub mod value;

// Re-export commonly used items for convenience
pub use tracing;

pub use dtype::ScalarType;
pub use graph::{Graph, Node, NodeInput, ValueId, ValueInfo, ValueKind};
pub use signature::{ArgType, OperatorSignature, Param, SignatureError, SignatureKey};
pub use value::{ConstTensor, IValue, TensorData, ValueError};
