use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CapabilityError {
    #[error("invalid backend version `{0}`, expected `major.minor[.patch]`")]
    InvalidVersion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BackendVersion {
    pub major: u32,
    pub minor: u32,
    #[serde(default)]
    pub patch: u32,
}

impl BackendVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Display for BackendVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for BackendVersion {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CapabilityError::InvalidVersion(s.to_string());
        let parts = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }
}

const CONFIGURABLE_ALIGN_CORNERS_SINCE: BackendVersion = BackendVersion::new(7, 1, 0);
const DYNAMIC_SHAPES_SINCE: BackendVersion = BackendVersion::new(6, 0, 0);
const FUSED_GROUP_NORM_SINCE: BackendVersion = BackendVersion::new(8, 6, 0);

/// What the target backend can express natively. Queried once per
/// conversion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendCapabilities {
    pub version: BackendVersion,
    /// Resize layers accept `align_corners = false` for linear interpolation.
    pub configurable_align_corners: bool,
    /// Layers may consume run-time shape tensors.
    pub dynamic_shape_input: bool,
    /// A native group-normalization layer exists.
    pub fused_group_norm: bool,
}

impl BackendCapabilities {
    pub fn for_version(version: BackendVersion) -> Self {
        Self {
            version,
            configurable_align_corners: version >= CONFIGURABLE_ALIGN_CORNERS_SINCE,
            dynamic_shape_input: version >= DYNAMIC_SHAPES_SINCE,
            fused_group_norm: version >= FUSED_GROUP_NORM_SINCE,
        }
    }
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self::for_version(BackendVersion::new(8, 0, 0))
    }
}
