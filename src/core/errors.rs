/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for policy operations
///
/// # Must Use
/// Registration and decision operations can fail and must be handled
#[must_use = "policy operations can fail and must be handled"]
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Unified error type for the permission engine
///
/// Configuration errors (`Parse`, `UnknownCheck`, `InvalidConfiguration`, ...) abort
/// model registration. `Forbidden` is only produced by the executor when it
/// translates a failed decision; the evaluator itself never errors on a denial.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PolicyError {
    #[error("Malformed policy expression '{expression}' at offset {offset}: {message}")]
    #[diagnostic(
        code(policy::parse_error),
        help("Combine check names with and/or/not and balanced parentheses.")
    )]
    Parse {
        expression: String,
        offset: usize,
        message: String,
    },

    #[error("Unknown check '{0}'")]
    #[diagnostic(
        code(policy::unknown_check),
        help("Register the check in the CheckRegistry before binding models that reference it.")
    )]
    UnknownCheck(String),

    #[error("Check '{0}' is already registered")]
    #[diagnostic(code(policy::duplicate_check))]
    DuplicateCheck(String),

    #[error("Poorly configured permission '{kind}' on {target}: {reason}")]
    #[diagnostic(
        code(policy::invalid_configuration),
        help("Supply exactly one of expression, all or any for each permission.")
    )]
    InvalidConfiguration {
        kind: String,
        target: String,
        reason: String,
    },

    #[error("Entity '{0}' is already bound")]
    #[diagnostic(code(policy::duplicate_entity))]
    DuplicateEntity(String),

    #[error("Unknown entity '{0}'")]
    #[diagnostic(
        code(policy::unknown_entity),
        help("Bind the model with EntityDictionary::bind_entity first.")
    )]
    UnknownEntity(String),

    #[error("Limit exceeded: {0}")]
    #[diagnostic(
        code(policy::limit_exceeded),
        help("Simplify the policy or raise the limit in EngineConfig.")
    )]
    LimitExceeded(String),

    #[error("ForbiddenAccess: {0}")]
    #[diagnostic(code(policy::forbidden))]
    Forbidden(String),

    #[error("Internal invariant violated: {0}")]
    #[diagnostic(
        code(policy::invariant_violation),
        help("A commit-phase expression must resolve to PASS or FAIL. Please report this issue.")
    )]
    InvariantViolation(String),

    #[error("Manifest error: {0}")]
    #[diagnostic(
        code(policy::manifest_error),
        help("Check that the manifest file exists and is valid JSON.")
    )]
    Manifest(String),
}

impl PolicyError {
    /// Whether this error is an expected authorization denial rather than a fault
    pub fn is_forbidden(&self) -> bool {
        matches!(self, PolicyError::Forbidden(_))
    }

    pub(crate) fn invalid_configuration(
        kind: impl ToString,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PolicyError::InvalidConfiguration {
            kind: kind.to_string(),
            target: target.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for PolicyError {
    fn from(err: std::io::Error) -> Self {
        PolicyError::Manifest(err.to_string())
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::Manifest(err.to_string())
    }
}
