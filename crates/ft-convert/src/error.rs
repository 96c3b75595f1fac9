use ft_backend::{NetworkError, PluginError};
use ft_core::{Node, SignatureKey, ValueError, ValueId};
use miette::Diagnostic;
use thiserror::Error;

/// Why a single node failed to lower.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("no converter registered for `{0}`")]
    UnsupportedOperator(SignatureKey),

    #[error("exactly one of output size or scale factors must be defined, got {found}")]
    AmbiguousResizeSpec { found: &'static str },

    #[error("{what} entry {value} is not a valid resize extent or scale")]
    InvalidResizeSpec { what: &'static str, value: String },

    #[error("{what} has rank {found}, expected {expected}")]
    RankMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("argument `{param}` expected {expected}, found {found}")]
    TypeMismatch {
        param: String,
        expected: String,
        found: String,
    },

    #[error("argument `{param}` must be supplied when input shapes are dynamic")]
    MissingRequiredTensor { param: String },

    #[error("unsupported capability combination: {0}")]
    UnsupportedCapabilityCombination(String),

    #[error("plugin creation failed: {0}")]
    PluginCreationFailure(#[from] PluginError),

    #[error("signature has no parameter `{0}`")]
    UnknownParam(String),

    #[error("node supplies {found} inputs but the signature declares {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("converter expects {expected} output(s), node declares {found}")]
    OutputArity { expected: usize, found: usize },

    #[error("IR value {0} is neither bound to a tensor nor evaluated")]
    UnboundValue(ValueId),

    #[error("IR value {0} is already bound")]
    AlreadyBound(ValueId),

    #[error("converter finished without binding output {0}")]
    UnboundOutput(ValueId),

    #[error("converter reported failure")]
    ConverterFailed,

    #[error("cannot materialize default for `{param}`: {source}")]
    UnknownShape {
        param: String,
        #[source]
        source: ValueError,
    },

    #[error(transparent)]
    Network(NetworkError),
}

impl From<NetworkError> for ErrorKind {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Plugin(err) => ErrorKind::PluginCreationFailure(err),
            other => ErrorKind::Network(other),
        }
    }
}

pub type LowerResult<T> = std::result::Result<T, ErrorKind>;

/// A failed conversion, tagged with the originating node.
#[derive(Debug, Error, Diagnostic)]
#[error("unable to convert node `{node}`: {kind}")]
#[diagnostic(
    code(ft::convert::node),
    help("the conversion pass is aborted; discard the context and fall back for this subgraph")
)]
pub struct ConversionError {
    pub node: String,
    pub kind: ErrorKind,
}

impl ConversionError {
    pub fn new(node: &Node, kind: ErrorKind) -> Self {
        Self {
            node: node.to_string(),
            kind,
        }
    }

    pub fn for_value(value: ValueId, kind: ErrorKind) -> Self {
        Self {
            node: format!("graph value {}", value),
            kind,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
