use crate::dtype::ScalarType;
use crate::signature::SignatureKey;
use crate::value::IValue;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl Display for ValueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Where an IR value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Graph input; `-1` marks a dimension only known at run time.
    Input { dtype: ScalarType, dims: Vec<i64> },
    /// Result of an evaluated IR constant.
    Constant(IValue),
    /// Output of the node at `node` in graph order.
    NodeOutput { node: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueInfo {
    pub id: ValueId,
    pub name: Option<String>,
    pub kind: ValueKind,
}

/// One operand slot of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeInput {
    Value(ValueId),
    Constant(IValue),
    Absent,
}

impl Display for NodeInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeInput::Value(id) => write!(f, "{}", id),
            NodeInput::Constant(value) => write!(f, "{}", value),
            NodeInput::Absent => write!(f, "None"),
        }
    }
}

impl From<ValueId> for NodeInput {
    fn from(value: ValueId) -> Self {
        NodeInput::Value(value)
    }
}

impl From<IValue> for NodeInput {
    fn from(value: IValue) -> Self {
        if value.is_none() {
            NodeInput::Absent
        } else {
            NodeInput::Constant(value)
        }
    }
}

/// An operator instance: qualified kind, overload tag, operands and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: String,
    overload: Option<String>,
    inputs: Vec<NodeInput>,
    outputs: Vec<ValueId>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            overload: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_overload(mut self, overload: impl Into<String>) -> Self {
        self.overload = Some(overload.into());
        self
    }

    pub fn with_input(mut self, input: impl Into<NodeInput>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = NodeInput>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn with_output(mut self, output: ValueId) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn overload(&self) -> Option<&str> {
        self.overload.as_deref()
    }

    pub fn inputs(&self) -> &[NodeInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    /// `aten::op` or `aten::op.overload`.
    pub fn schema_name(&self) -> String {
        match &self.overload {
            Some(overload) => format!("{}.{}", self.kind, overload),
            None => self.kind.clone(),
        }
    }

    pub fn signature_key(&self) -> SignatureKey {
        SignatureKey::new(&self.kind, self.overload.as_deref(), self.inputs.len())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.outputs.is_empty() {
            write!(f, "{} = ", self.outputs.iter().join(", "))?;
        }
        write!(
            f,
            "{}({})",
            self.schema_name(),
            self.inputs.iter().join(", ")
        )
    }
}

/// A straight-line IR graph: inputs, evaluated constants and nodes in
/// topological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    values: Vec<ValueInfo>,
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_value(&mut self, name: Option<String>, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueInfo { id, name, kind });
        id
    }

    pub fn add_input(&mut self, name: impl Into<String>, dtype: ScalarType, dims: Vec<i64>) -> ValueId {
        let id = self.push_value(Some(name.into()), ValueKind::Input { dtype, dims });
        self.inputs.push(id);
        id
    }

    pub fn add_constant(&mut self, value: IValue) -> ValueId {
        self.push_value(None, ValueKind::Constant(value))
    }

    /// Appends a single-output node and returns its result value.
    pub fn add_node(
        &mut self,
        kind: impl Into<String>,
        overload: Option<&str>,
        inputs: Vec<NodeInput>,
    ) -> ValueId {
        let index = self.nodes.len();
        let output = self.push_value(None, ValueKind::NodeOutput { node: index });
        let mut node = Node::new(kind).with_inputs(inputs).with_output(output);
        if let Some(overload) = overload {
            node = node.with_overload(overload);
        }
        self.nodes.push(node);
        output
    }

    pub fn mark_output(&mut self, value: ValueId) {
        self.outputs.push(value);
    }

    pub fn value(&self, id: ValueId) -> Option<&ValueInfo> {
        self.values.get(id.0 as usize)
    }

    pub fn values(&self) -> &[ValueInfo] {
        &self.values
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_node_for_diagnostics() {
        let mut graph = Graph::new();
        let x = graph.add_input("x", ScalarType::Float32, vec![1, 3, 8, 8]);
        let out = graph.add_node(
            "aten::upsample_nearest2d",
            Some("vec"),
            vec![
                x.into(),
                IValue::IntList(vec![16, 16]).into(),
                NodeInput::Absent,
            ],
        );

        let node = &graph.nodes()[0];
        assert_eq!(node.outputs(), &[out]);
        assert_eq!(
            node.to_string(),
            "%1 = aten::upsample_nearest2d.vec(%0, [16, 16], None)"
        );
        assert_eq!(node.signature_key().arity, 3);
    }

    #[test]
    fn none_constants_become_absent_inputs() {
        assert_eq!(NodeInput::from(IValue::None), NodeInput::Absent);
    }
}
