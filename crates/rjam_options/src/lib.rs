//! rjam_options: registry configuration.
//!
//! Parses the JSON options document that tunes the rule and target
//! registries. Every field is optional; an empty document `{}` yields the
//! defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning knobs for a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryOptions {
    /// Upper bound on qualified rule names (module name + rule name).
    /// Root-module rules keep their bare name and are not checked.
    /// `None` places no bound; names are never truncated either way.
    pub max_qualified_name_len: Option<usize>,
    /// Preallocation hint for the target table.
    pub target_capacity: Option<usize>,
    /// Preallocation hint for the settings node pool.
    pub settings_pool_capacity: Option<usize>,
}

impl RegistryOptions {
    /// Reject option combinations no registry can honour.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_qualified_name_len == Some(0) {
            return Err(OptionsError::Invalid(
                "maxQualifiedNameLen must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors produced while loading options.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to parse registry options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read {path}: {error}")]
    Io {
        path: String,
        error: std::io::Error,
    },

    #[error("invalid registry options: {0}")]
    Invalid(String),
}

/// Parse and validate options from a JSON string.
pub fn parse_options(content: &str) -> Result<RegistryOptions, OptionsError> {
    let options: RegistryOptions = serde_json::from_str(content)?;
    options.validate()?;
    Ok(options)
}

/// Parse and validate options from a file.
pub fn parse_options_file(path: &str) -> Result<RegistryOptions, OptionsError> {
    let content = std::fs::read_to_string(path).map_err(|error| OptionsError::Io {
        path: path.to_string(),
        error,
    })?;
    parse_options(&content)
}
