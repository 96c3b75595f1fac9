//! Node arguments resolved against a signature.
//!
//! Each declared parameter becomes an [`Arg`]: a backend tensor, an evaluated
//! constant, or absent. Converters read them through typed accessors which
//! fail with [`ErrorKind::TypeMismatch`] instead of panicking.

use crate::context::ConversionCtx;
use crate::error::{ErrorKind, LowerResult};
use ft_backend::TensorId;
use ft_core::{ArgType, ConstTensor, IValue, Node, NodeInput, OperatorSignature, ValueError};

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Tensor(TensorId),
    Constant(IValue),
    Absent,
}

impl ArgValue {
    fn describe(&self) -> String {
        match self {
            ArgValue::Tensor(id) => format!("tensor {}", id),
            ArgValue::Constant(value) => value.type_name().to_string(),
            ArgValue::Absent => "None".to_string(),
        }
    }
}

fn constant_or_absent(value: IValue) -> ArgValue {
    if value.is_none() {
        ArgValue::Absent
    } else {
        ArgValue::Constant(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    name: String,
    ty: ArgType,
    value: ArgValue,
}

impl Arg {
    pub fn new(name: impl Into<String>, ty: ArgType, value: ArgValue) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ArgType {
        &self.ty
    }

    pub fn value(&self) -> &ArgValue {
        &self.value
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.value, ArgValue::Absent)
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self.value, ArgValue::Tensor(_))
    }

    fn mismatch(&self, expected: &str) -> ErrorKind {
        ErrorKind::TypeMismatch {
            param: self.name.clone(),
            expected: expected.to_string(),
            found: self.value.describe(),
        }
    }

    /// The backend tensor for this argument. Constant tensors are
    /// materialized as constant layers.
    pub fn as_tensor(&self, ctx: &mut ConversionCtx<'_>) -> LowerResult<TensorId> {
        match &self.value {
            ArgValue::Tensor(id) => Ok(*id),
            ArgValue::Constant(IValue::Tensor(tensor)) => ctx.tensor_to_const(tensor),
            ArgValue::Absent => Err(ErrorKind::MissingRequiredTensor {
                param: self.name.clone(),
            }),
            ArgValue::Constant(_) => Err(self.mismatch("Tensor")),
        }
    }

    /// Like [`Arg::as_tensor`], but an absent argument is replaced by the
    /// constant built by `default`. Defaults derived from input shapes are
    /// refused in dynamic-shape mode.
    pub fn as_tensor_or(
        &self,
        ctx: &mut ConversionCtx<'_>,
        default: impl FnOnce() -> Result<ConstTensor, ValueError>,
    ) -> LowerResult<TensorId> {
        if !self.is_absent() {
            return self.as_tensor(ctx);
        }
        if ctx.input_is_dynamic() {
            return Err(ErrorKind::MissingRequiredTensor {
                param: self.name.clone(),
            });
        }
        let tensor = default().map_err(|source| ErrorKind::UnknownShape {
            param: self.name.clone(),
            source,
        })?;
        ctx.tensor_to_const(&tensor)
    }

    pub fn as_int(&self) -> LowerResult<i64> {
        match &self.value {
            ArgValue::Constant(IValue::Int(value)) => Ok(*value),
            _ => Err(self.mismatch("int")),
        }
    }

    pub fn as_double(&self) -> LowerResult<f64> {
        match &self.value {
            ArgValue::Constant(IValue::Double(value)) => Ok(*value),
            ArgValue::Constant(IValue::Int(value)) => Ok(*value as f64),
            _ => Err(self.mismatch("float")),
        }
    }

    pub fn as_double_or(&self, default: f64) -> LowerResult<f64> {
        match self.value {
            ArgValue::Absent => Ok(default),
            _ => self.as_double(),
        }
    }

    pub fn as_bool(&self) -> LowerResult<bool> {
        match &self.value {
            ArgValue::Constant(IValue::Bool(value)) => Ok(*value),
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn as_int_list(&self) -> LowerResult<Vec<i64>> {
        match &self.value {
            ArgValue::Constant(IValue::IntList(values)) => Ok(values.clone()),
            ArgValue::Constant(IValue::Int(value)) => Ok(vec![*value]),
            _ => Err(self.mismatch("int[]")),
        }
    }

    pub fn as_double_list(&self) -> LowerResult<Vec<f64>> {
        match &self.value {
            ArgValue::Constant(IValue::DoubleList(values)) => Ok(values.clone()),
            ArgValue::Constant(IValue::IntList(values)) => {
                Ok(values.iter().map(|v| *v as f64).collect())
            }
            _ => Err(self.mismatch("float[]")),
        }
    }

    pub fn opt_double(&self) -> LowerResult<Option<f64>> {
        if self.is_absent() {
            return Ok(None);
        }
        self.as_double().map(Some)
    }

    pub fn opt_int_list(&self) -> LowerResult<Option<Vec<i64>>> {
        if self.is_absent() {
            return Ok(None);
        }
        self.as_int_list().map(Some)
    }

    pub fn opt_double_list(&self) -> LowerResult<Option<Vec<f64>>> {
        if self.is_absent() {
            return Ok(None);
        }
        self.as_double_list().map(Some)
    }
}

/// The resolved arguments of one node, in signature order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    args: Vec<Arg>,
}

impl Args {
    /// Pairs each declared parameter with the node input at the same position.
    ///
    /// Value inputs resolve to their bound tensor, or to their evaluated
    /// constant. An absent input takes the parameter's declared default when
    /// there is one.
    ///
    /// Trailing inputs may also be omitted entirely, but only when calling this
    /// directly: [`convert_node`](crate::convert_node) looks converters up by
    /// arity, so a registered node always supplies every declared input.
    pub fn resolve(
        ctx: &ConversionCtx<'_>,
        signature: &OperatorSignature,
        node: &Node,
    ) -> LowerResult<Self> {
        if node.inputs().len() > signature.params.len() {
            return Err(ErrorKind::ArityMismatch {
                expected: signature.params.len(),
                found: node.inputs().len(),
            });
        }
        let mut args = Vec::with_capacity(signature.params.len());
        for (idx, param) in signature.params.iter().enumerate() {
            let value = match node.inputs().get(idx) {
                Some(NodeInput::Value(id)) => {
                    if let Some(tensor) = ctx.tensor_for(*id) {
                        ArgValue::Tensor(tensor)
                    } else if let Some(value) = ctx.evaluated(*id) {
                        constant_or_absent(value.clone())
                    } else {
                        return Err(ErrorKind::UnboundValue(*id));
                    }
                }
                Some(NodeInput::Constant(value)) => constant_or_absent(value.clone()),
                Some(NodeInput::Absent) | None => match &param.default {
                    Some(default) => constant_or_absent(default.clone()),
                    None => ArgValue::Absent,
                },
            };
            args.push(Arg::new(param.name.clone(), param.ty.clone(), value));
        }
        Ok(Self { args })
    }

    pub fn get(&self, idx: usize) -> Option<&Arg> {
        self.args.get(idx)
    }

    pub fn named(&self, name: &str) -> Option<&Arg> {
        self.args.iter().find(|arg| arg.name == name)
    }

    pub fn required(&self, name: &str) -> LowerResult<&Arg> {
        self.named(name)
            .ok_or_else(|| ErrorKind::UnknownParam(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
