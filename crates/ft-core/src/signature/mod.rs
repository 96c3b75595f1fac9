//! Operator signatures.
//!
//! Converters are registered against textual schemas such as
//! `aten::upsample_nearest2d.vec(Tensor self, int[2] output_size, float? scales_h=None) -> (Tensor)`.
//! The text is parsed exactly once into an [`OperatorSignature`]; lookups go
//! through the derived [`SignatureKey`] and never re-parse.

mod parser;

use crate::value::IValue;
use itertools::Itertools;
use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SignatureError {
    #[error("malformed operator signature: {reason}")]
    #[diagnostic(
        code(ft::signature::malformed),
        help("expected `<namespace>::<op>[.<overload>](<Type> <name>[=<default>], ...) -> (<Type>, ...)`")
    )]
    Malformed {
        #[source_code]
        src: String,
        #[label("unexpected input here")]
        span: SourceSpan,
        reason: String,
    },

    #[error("parameter `{name}` is declared more than once")]
    #[diagnostic(code(ft::signature::duplicate_param))]
    DuplicateParam { name: String },

    #[error("default `{default}` does not fit parameter `{name}` of type `{ty}`")]
    #[diagnostic(
        code(ft::signature::bad_default),
        help("only optional parameters may default to None")
    )]
    BadDefault {
        name: String,
        ty: String,
        default: String,
    },
}

/// Declared type of a parameter or return slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgType {
    Tensor,
    Int,
    Float,
    Bool,
    Str,
    Scalar,
    List {
        elem: Box<ArgType>,
        len: Option<usize>,
    },
    Optional(Box<ArgType>),
}

impl ArgType {
    pub fn is_optional(&self) -> bool {
        matches!(self, ArgType::Optional(_))
    }

    /// The type with any `?` stripped.
    pub fn inner(&self) -> &ArgType {
        match self {
            ArgType::Optional(inner) => inner.inner(),
            other => other,
        }
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self.inner(), ArgType::Tensor)
    }

    /// Fixed length of `T[n]`, if declared.
    pub fn list_len(&self) -> Option<usize> {
        match self.inner() {
            ArgType::List { len, .. } => *len,
            _ => None,
        }
    }
}

impl Display for ArgType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgType::Tensor => write!(f, "Tensor"),
            ArgType::Int => write!(f, "int"),
            ArgType::Float => write!(f, "float"),
            ArgType::Bool => write!(f, "bool"),
            ArgType::Str => write!(f, "str"),
            ArgType::Scalar => write!(f, "Scalar"),
            ArgType::List { elem, len: Some(len) } => write!(f, "{}[{}]", elem, len),
            ArgType::List { elem, len: None } => write!(f, "{}[]", elem),
            ArgType::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: ArgType,
    pub name: String,
    pub default: Option<IValue>,
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)?;
        if let Some(default) = &self.default {
            write!(f, "={}", default)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Return {
    pub ty: ArgType,
    pub name: Option<String>,
}

impl Display for Return {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", self.ty, name),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// Registry key: qualified operator name, overload tag (empty when absent)
/// and number of declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureKey {
    pub qualified_name: String,
    pub overload: String,
    pub arity: usize,
}

impl SignatureKey {
    pub fn new(qualified_name: &str, overload: Option<&str>, arity: usize) -> Self {
        Self {
            qualified_name: qualified_name.to_string(),
            overload: overload.unwrap_or_default().to_string(),
            arity,
        }
    }
}

impl Display for SignatureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.overload.is_empty() {
            write!(f, "{}/{}", self.qualified_name, self.arity)
        } else {
            write!(f, "{}.{}/{}", self.qualified_name, self.overload, self.arity)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSignature {
    pub namespace: String,
    pub name: String,
    pub overload: Option<String>,
    pub params: Vec<Param>,
    pub returns: Vec<Return>,
}

impl OperatorSignature {
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let mut signature = parser::parse(text)?;
        signature.validate()?;
        Ok(signature)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.namespace, self.name)
    }

    pub fn key(&self) -> SignatureKey {
        SignatureKey::new(
            &self.qualified_name(),
            self.overload.as_deref(),
            self.params.len(),
        )
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|param| param.name == name)
    }

    fn validate(&mut self) -> Result<(), SignatureError> {
        if let Some(name) = self.params.iter().map(|p| &p.name).duplicates().next() {
            return Err(SignatureError::DuplicateParam { name: name.clone() });
        }
        for param in &mut self.params {
            if let Some(default) = param.default.take() {
                let coerced = coerce_default(&param.ty, default.clone()).ok_or_else(|| {
                    SignatureError::BadDefault {
                        name: param.name.clone(),
                        ty: param.ty.to_string(),
                        default: default.to_string(),
                    }
                })?;
                param.default = Some(coerced);
            }
        }
        Ok(())
    }
}

/// Brings a parsed default literal in line with the declared type, e.g. `1`
/// for a `float` parameter becomes `1.0`.
fn coerce_default(ty: &ArgType, value: IValue) -> Option<IValue> {
    match (ty, value) {
        (ArgType::Optional(_), IValue::None) => Some(IValue::None),
        (ArgType::Optional(inner), value) => coerce_default(inner, value),
        (ArgType::Int, value @ IValue::Int(_)) => Some(value),
        (ArgType::Float, IValue::Int(v)) => Some(IValue::Double(v as f64)),
        (ArgType::Float, value @ IValue::Double(_)) => Some(value),
        (ArgType::Scalar, value @ (IValue::Int(_) | IValue::Double(_))) => Some(value),
        (ArgType::Bool, value @ IValue::Bool(_)) => Some(value),
        (ArgType::Str, value @ IValue::Str(_)) => Some(value),
        (ArgType::List { elem, len }, value) => {
            let count = match &value {
                IValue::IntList(values) => values.len(),
                IValue::DoubleList(values) => values.len(),
                _ => return None,
            };
            if len.is_some_and(|len| len != count && count != 0) {
                return None;
            }
            match (elem.as_ref(), value) {
                (ArgType::Int, value @ IValue::IntList(_)) => Some(value),
                (ArgType::Float, IValue::IntList(values)) => Some(IValue::DoubleList(
                    values.into_iter().map(|v| v as f64).collect(),
                )),
                (ArgType::Float, value @ IValue::DoubleList(_)) => Some(value),
                _ => None,
            }
        }
        _ => None,
    }
}

impl FromStr for OperatorSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OperatorSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)?;
        if let Some(overload) = &self.overload {
            write!(f, ".{}", overload)?;
        }
        write!(
            f,
            "({}) -> ({})",
            self.params.iter().join(", "),
            self.returns.iter().join(", ")
        )
    }
}
