//! Errors reported by the registry.

use rjam_options::OptionsError;
use thiserror::Error;

/// Failures of registry operations.
///
/// Every check runs before the registry is mutated, so a failed call
/// leaves all tables exactly as they were.
#[derive(Debug, Error)]
pub enum RulesError {
    /// A qualified name (module name followed by rule name) is longer than
    /// the configured `maxQualifiedNameLen`.
    #[error("qualified rule name `{name}` is {len} bytes, over the limit of {limit}")]
    QualifiedNameTooLong {
        name: String,
        len: usize,
        limit: usize,
    },

    #[error(transparent)]
    Options(#[from] OptionsError),
}
