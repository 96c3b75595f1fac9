//! Converter registry keyed by operator signature.
//!
//! Registration is a builder chain:
//!
//! ```ignore
//! let registry = ConverterRegistry::builder()
//!     .pattern("aten::upsample_nearest1d(Tensor self, int[1] output_size, float? scales=None) -> (Tensor)",
//!              LoweringRule::Resize(ResizeRule::nearest(1)))
//!     .build()?;
//! ```
//!
//! The first malformed or duplicate pattern is reported by `build`. A built
//! registry is read-only and may be shared across conversion passes.

use crate::converters;
use crate::error::{ErrorKind, LowerResult};
use crate::rule::LoweringRule;
use ft_core::{Node, OperatorSignature, SignatureError, SignatureKey};
use miette::Diagnostic;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Signature(#[from] SignatureError),

    #[error("a converter for `{signature}` is already registered")]
    #[diagnostic(
        code(ft::registry::duplicate),
        help("overloads must differ in name, overload tag or number of parameters")
    )]
    Duplicate { signature: String },
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub signature: OperatorSignature,
    pub rule: LoweringRule,
}

#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    entries: BTreeMap<SignatureKey, Registration>,
}

impl ConverterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding the resize family and group normalization.
    pub fn with_default_converters() -> Result<Self, RegistryError> {
        converters::register_defaults(Self::builder()).build()
    }

    pub fn resolve(&self, node: &Node) -> LowerResult<&Registration> {
        let key = node.signature_key();
        self.entries
            .get(&key)
            .ok_or(ErrorKind::UnsupportedOperator(key))
    }

    /// Whether a converter is registered for the canonical form of `signature`.
    pub fn contains(&self, signature: &str) -> bool {
        match OperatorSignature::parse(signature) {
            Ok(signature) => self
                .entries
                .get(&signature.key())
                .is_some_and(|entry| entry.signature == signature),
            Err(_) => false,
        }
    }

    pub fn signatures(&self) -> impl Iterator<Item = &OperatorSignature> {
        self.entries.values().map(|entry| &entry.signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<SignatureKey, Registration>,
    error: Option<RegistryError>,
}

impl RegistryBuilder {
    pub fn pattern(mut self, signature: &str, rule: LoweringRule) -> Self {
        if self.error.is_some() {
            return self;
        }
        let signature = match OperatorSignature::parse(signature) {
            Ok(signature) => signature,
            Err(err) => {
                self.error = Some(err.into());
                return self;
            }
        };
        let key = signature.key();
        if self.entries.contains_key(&key) {
            self.error = Some(RegistryError::Duplicate {
                signature: signature.to_string(),
            });
            return self;
        }
        debug!("Registered converter for {}", signature);
        self.entries.insert(key, Registration { signature, rule });
        self
    }

    pub fn build(self) -> Result<ConverterRegistry, RegistryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(ConverterRegistry {
                entries: self.entries,
            }),
        }
    }
}
