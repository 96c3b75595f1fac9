//! Shared fixtures for ft-convert conversion tests.
#![allow(dead_code)]

pub mod assertions;
pub mod graphs;

use ft_backend::{Network, PluginRegistry};
use ft_convert::{convert_graph, ConversionError, ConversionSettings, ConverterRegistry};
use ft_core::Graph;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn settings(version: &str) -> ConversionSettings {
    ConversionSettings::for_version(version.parse().expect("valid backend version"))
}

pub fn dynamic_settings(version: &str) -> ConversionSettings {
    settings(version).with_dynamic_shapes(true)
}

pub fn registry() -> ConverterRegistry {
    ConverterRegistry::with_default_converters().expect("built-in patterns register")
}

/// Converts `graph` with the default converters and built-in plugins.
pub fn convert(graph: &Graph, settings: ConversionSettings) -> Result<Network, ConversionError> {
    init_tracing();
    let plugins = PluginRegistry::with_builtin_creators();
    convert_graph(graph, &registry(), &plugins, settings)
}
