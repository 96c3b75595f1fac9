//! Opaque compute plugins.
//!
//! A plugin is created by name from a [`PluginRegistry`] and parameterized by
//! an ordered list of typed fields. The network only records the plugin's type,
//! instance name and fields; the kernels themselves live outside this crate.

mod group_norm;
mod interpolate;

pub use group_norm::{GroupNormPlugin, GroupNormPluginCreator, PLUGIN_NAME as GROUP_NORM_PLUGIN};
pub use interpolate::{InterpolatePlugin, InterpolatePluginCreator, PLUGIN_NAME as INTERPOLATE_PLUGIN};

use crate::dims::Dims;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::Display;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PluginError {
    #[error("no plugin creator registered under `{0}`")]
    CreatorNotFound(String),
    #[error("plugin creator `{0}` is already registered")]
    DuplicateCreator(String),
    #[error("plugin `{plugin}` requires field `{field}`")]
    MissingField { plugin: String, field: String },
    #[error("plugin `{plugin}` field `{field}` must be {expected}")]
    InvalidField {
        plugin: String,
        field: String,
        expected: String,
    },
    #[error("plugin `{plugin}` cannot accept inputs {inputs:?}: {reason}")]
    InvalidInputs {
        plugin: String,
        inputs: Vec<Dims>,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PluginFieldType {
    Float32,
    Int32,
    Char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PluginFieldData {
    Float32(Vec<f32>),
    Int32(Vec<i32>),
    Char(String),
}

impl PluginFieldData {
    pub fn field_type(&self) -> PluginFieldType {
        match self {
            PluginFieldData::Float32(_) => PluginFieldType::Float32,
            PluginFieldData::Int32(_) => PluginFieldType::Int32,
            PluginFieldData::Char(_) => PluginFieldType::Char,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PluginFieldData::Float32(values) => values.len(),
            PluginFieldData::Int32(values) => values.len(),
            PluginFieldData::Char(value) => value.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One `(name, typed value, count)` entry; the count is the data length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginField {
    pub name: String,
    pub data: PluginFieldData,
}

impl PluginField {
    pub fn new(name: impl Into<String>, data: PluginFieldData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn float32(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, PluginFieldData::Float32(vec![value]))
    }

    pub fn int32(name: impl Into<String>, value: i32) -> Self {
        Self::new(name, PluginFieldData::Int32(vec![value]))
    }

    pub fn int32s(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self::new(name, PluginFieldData::Int32(values))
    }

    pub fn chars(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, PluginFieldData::Char(value.into()))
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PluginFieldCollection {
    fields: Vec<PluginField>,
}

impl PluginFieldCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: PluginField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: PluginField) {
        self.fields.push(field);
    }

    pub fn get(&self, name: &str) -> Option<&PluginField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&self, plugin: &str, name: &str) -> Result<&PluginField, PluginError> {
        self.get(name).ok_or_else(|| PluginError::MissingField {
            plugin: plugin.to_string(),
            field: name.to_string(),
        })
    }

    pub(crate) fn single_f32(&self, plugin: &str, name: &str) -> Result<f32, PluginError> {
        match &self.require(plugin, name)?.data {
            PluginFieldData::Float32(values) if values.len() == 1 => Ok(values[0]),
            _ => Err(invalid(plugin, name, "a single float32")),
        }
    }

    pub(crate) fn single_i32(&self, plugin: &str, name: &str) -> Result<i32, PluginError> {
        match &self.require(plugin, name)?.data {
            PluginFieldData::Int32(values) if values.len() == 1 => Ok(values[0]),
            _ => Err(invalid(plugin, name, "a single int32")),
        }
    }

    pub(crate) fn i32_list(&self, plugin: &str, name: &str) -> Result<&[i32], PluginError> {
        match &self.require(plugin, name)?.data {
            PluginFieldData::Int32(values) => Ok(values),
            _ => Err(invalid(plugin, name, "an int32 list")),
        }
    }

    pub(crate) fn chars(&self, plugin: &str, name: &str) -> Result<&str, PluginError> {
        match &self.require(plugin, name)?.data {
            PluginFieldData::Char(value) => Ok(value),
            _ => Err(invalid(plugin, name, "a character string")),
        }
    }
}

pub(crate) fn invalid(plugin: &str, field: &str, expected: &str) -> PluginError {
    PluginError::InvalidField {
        plugin: plugin.to_string(),
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

/// A configured plugin instance, ready to be added to a network.
pub trait Plugin: std::fmt::Debug + Send + Sync {
    fn plugin_type(&self) -> &str;

    fn plugin_version(&self) -> &str {
        "1"
    }

    fn instance_name(&self) -> &str;

    /// The field list the instance was created from.
    fn fields(&self) -> &PluginFieldCollection;

    fn output_dims(&self, inputs: &[Dims]) -> Result<Dims, PluginError>;
}

pub trait PluginCreator: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "1"
    }

    fn create_plugin(
        &self,
        instance_name: &str,
        fields: &PluginFieldCollection,
    ) -> Result<Box<dyn Plugin>, PluginError>;
}

/// Creator lookup by name. Built once per process and read-only afterwards.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    creators: HashMap<String, Arc<dyn PluginCreator>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `Interpolate` and `GroupNormalizationPlugin` creators.
    pub fn with_builtin_creators() -> Self {
        let mut registry = Self::new();
        registry
            .creators
            .insert(interpolate::PLUGIN_NAME.to_string(), Arc::new(InterpolatePluginCreator));
        registry
            .creators
            .insert(group_norm::PLUGIN_NAME.to_string(), Arc::new(GroupNormPluginCreator));
        registry
    }

    pub fn register(&mut self, creator: Arc<dyn PluginCreator>) -> Result<(), PluginError> {
        let name = creator.name().to_string();
        if self.creators.contains_key(&name) {
            return Err(PluginError::DuplicateCreator(name));
        }
        self.creators.insert(name, creator);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    pub fn creator(&self, name: &str) -> Option<&Arc<dyn PluginCreator>> {
        self.creators.get(name)
    }

    pub fn create_plugin(
        &self,
        name: &str,
        instance_name: &str,
        fields: &PluginFieldCollection,
    ) -> Result<Box<dyn Plugin>, PluginError> {
        let creator = self
            .creator(name)
            .ok_or_else(|| PluginError::CreatorNotFound(name.to_string()))?;
        creator.create_plugin(instance_name, fields)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.creators.keys().collect();
        names.sort();
        f.debug_struct("PluginRegistry")
            .field("creators", &names)
            .finish()
    }
}
