//! Pipeline configuration
//!
//! Options can be set programmatically or loaded from TOML:
//!
//! ```toml
//! strict = true
//! wrap_output = false
//! default_locale = "it"
//!
//! [media]
//! local = true
//! remote = false
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QuillError, Result};

/// Default limit on nested function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Options controlling one compilation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Fail on the first call error instead of rendering an error node
    pub strict: bool,
    /// Wrap the rendered body in a complete output document
    pub wrap_output: bool,
    /// Locale used when the document sets none
    pub default_locale: Option<String>,
    /// Name used when the document sets none
    pub document_name: Option<String>,
    /// Maximum depth of nested calls before compilation fails
    pub max_call_depth: usize,
    /// Media storage overrides
    pub media: MediaOverrides,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            wrap_output: true,
            default_locale: None,
            document_name: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            media: MediaOverrides::default(),
        }
    }
}

impl PipelineOptions {
    /// Parse options from TOML, filling unset fields with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| QuillError::Resource {
            path: "configuration".to_string(),
            message: err.message().to_string(),
        })
    }
}

/// Which media are copied into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaStorageOptions {
    /// Files on the local file system
    pub local: bool,
    /// Files behind a URL
    pub remote: bool,
}

impl MediaStorageOptions {
    /// Apply user overrides over a target's preference
    pub fn merged(self, overrides: &MediaOverrides) -> Self {
        Self {
            local: overrides.local.unwrap_or(self.local),
            remote: overrides.remote.unwrap_or(self.remote),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.local || self.remote
    }
}

/// User overrides of [`MediaStorageOptions`]; unset fields keep the
/// target's preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaOverrides {
    pub local: Option<bool>,
    pub remote: Option<bool>,
}
