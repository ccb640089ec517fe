mod docker;

pub use docker::*;

use std::{fmt, path::Path};

/// One structured entry emitted while building an image, for example `{"stream": "Step 1/4 : FROM
/// node"}`.
pub type BuildLogRecord = serde_json::Map<String, serde_json::Value>;

pub struct BuildImageOptions<'a> {
    pub path: &'a Path,
    pub tag: &'a str,
    pub use_cache: bool,
    pub pull: bool,
    pub remove_intermediate_containers: bool,
}

#[derive(Debug)]
pub struct BuiltImage {
    pub id: String,
    pub logs: Vec<BuildLogRecord>,
}

#[derive(Debug)]
pub enum BuildImageError {
    /// One of the build steps failed. Carries the records produced up to the failure.
    Build {
        message: String,
        logs: Vec<BuildLogRecord>,
    },
    /// Transport or protocol failure while talking to the engine.
    Api { message: String },
}

impl fmt::Display for BuildImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildImageError::Build { message, .. } => f.write_str(message),
            BuildImageError::Api { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for BuildImageError {}

/// No container engine could be reached.
#[derive(Debug)]
pub struct EngineUnavailable {
    reason: String,
}

impl EngineUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EngineUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no container engine is reachable: {}", self.reason)
    }
}

impl std::error::Error for EngineUnavailable {}

pub trait Engine {
    fn build_image(&self, options: BuildImageOptions) -> Result<BuiltImage, BuildImageError>;
}
