//! Error types for role and policy construction
//!
//! Evaluation itself never fails: every query resolves to a boolean, with
//! deny as the default. Errors only arise when loading or mutating roles.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, RbacError>;

/// Role and policy construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RbacError {
    /// Glob pattern is malformed (unterminated character class)
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// One or more resource patterns in a role are malformed
    #[error("invalid resource(s): {0}")]
    InvalidResources(String),

    /// Resource names were already set for a policy
    #[error("resource names for role exist")]
    ResourceNamesExist,

    /// Resource name is already present on a policy
    #[error("resource name exists: {0}")]
    ResourceNameExists(String),
}
