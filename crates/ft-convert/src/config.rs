use ft_backend::{BackendCapabilities, BackendVersion, CapabilityError};
use serde::Deserialize;

pub const DYNAMIC_SHAPES_ENV: &str = "FT_DYNAMIC_SHAPES";
pub const BACKEND_VERSION_ENV: &str = "FT_BACKEND_VERSION";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid conversion settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Version(#[from] CapabilityError),
}

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

/// Per-pass settings, fixed for the lifetime of a conversion context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConversionSettings {
    /// Input extents are only known at run time. Converters may not derive
    /// constants from input shapes.
    pub dynamic_shapes: bool,
    pub capabilities: BackendCapabilities,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    dynamic_shapes: bool,
    backend_version: Option<String>,
    configurable_align_corners: Option<bool>,
    dynamic_shape_input: Option<bool>,
    fused_group_norm: Option<bool>,
}

impl ConversionSettings {
    pub fn new(capabilities: BackendCapabilities) -> Self {
        Self {
            dynamic_shapes: false,
            capabilities,
        }
    }

    pub fn for_version(version: BackendVersion) -> Self {
        Self::new(BackendCapabilities::for_version(version))
    }

    pub fn with_dynamic_shapes(mut self, dynamic_shapes: bool) -> Self {
        self.dynamic_shapes = dynamic_shapes;
        self
    }

    /// Parses a settings document such as
    /// `{"backend_version": "7.0", "dynamic_shapes": true}`. Individual
    /// capability flags override what the version implies.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_str(text)?;
        let mut capabilities = match raw.backend_version {
            Some(version) => BackendCapabilities::for_version(version.parse()?),
            None => BackendCapabilities::default(),
        };
        if let Some(flag) = raw.configurable_align_corners {
            capabilities.configurable_align_corners = flag;
        }
        if let Some(flag) = raw.dynamic_shape_input {
            capabilities.dynamic_shape_input = flag;
        }
        if let Some(flag) = raw.fused_group_norm {
            capabilities.fused_group_norm = flag;
        }
        Ok(Self::new(capabilities).with_dynamic_shapes(raw.dynamic_shapes))
    }

    /// Applies `FT_BACKEND_VERSION` and `FT_DYNAMIC_SHAPES` on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(version) = std::env::var(BACKEND_VERSION_ENV) {
            self.capabilities = BackendCapabilities::for_version(version.parse()?);
        }
        if let Some(dynamic) = env_true(DYNAMIC_SHAPES_ENV) {
            self.dynamic_shapes = dynamic;
        }
        Ok(self)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flags_override_version() {
        let settings = ConversionSettings::from_json(
            r#"{"backend_version": "7.0", "fused_group_norm": true, "dynamic_shapes": true}"#,
        )
        .unwrap();
        assert!(settings.dynamic_shapes);
        assert!(!settings.capabilities.configurable_align_corners);
        assert!(settings.capabilities.fused_group_norm);
        assert_eq!(settings.capabilities.version, BackendVersion::new(7, 0, 0));
    }

    #[test]
    fn empty_json_is_default() {
        let settings = ConversionSettings::from_json("{}").unwrap();
        assert_eq!(settings, ConversionSettings::default());
    }

    #[test]
    fn rejects_unknown_keys_and_bad_versions() {
        assert!(matches!(
            ConversionSettings::from_json(r#"{"precision": "fp16"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ConversionSettings::from_json(r#"{"backend_version": "latest"}"#),
            Err(ConfigError::Version(_))
        ));
    }
}
