use ft_core::{Graph, IValue, NodeInput, ScalarType, ValueId};

pub fn int_list(values: &[i64]) -> NodeInput {
    NodeInput::Constant(IValue::IntList(values.to_vec()))
}

pub fn double_list(values: &[f64]) -> NodeInput {
    NodeInput::Constant(IValue::DoubleList(values.to_vec()))
}

pub fn double(value: f64) -> NodeInput {
    NodeInput::Constant(IValue::Double(value))
}

pub fn int(value: i64) -> NodeInput {
    NodeInput::Constant(IValue::Int(value))
}

pub fn boolean(value: bool) -> NodeInput {
    NodeInput::Constant(IValue::Bool(value))
}

pub fn none() -> NodeInput {
    NodeInput::Absent
}

/// A graph with one float input and a single operator applied to it. The
/// operator's first operand is the input; `rest` follows.
pub fn unary_graph(
    dims: &[i64],
    kind: &str,
    overload: Option<&str>,
    rest: Vec<NodeInput>,
) -> (Graph, ValueId) {
    let mut graph = Graph::new();
    let input = graph.add_input("x", ScalarType::Float32, dims.to_vec());
    let mut operands = vec![NodeInput::Value(input)];
    operands.extend(rest);
    let output = graph.add_node(kind, overload, operands);
    graph.mark_output(output);
    (graph, input)
}

pub fn group_norm_graph(dims: &[i64], num_groups: i64, eps: NodeInput) -> Graph {
    unary_graph(
        dims,
        "aten::group_norm",
        None,
        vec![int(num_groups), none(), none(), eps, boolean(true)],
    )
    .0
}
