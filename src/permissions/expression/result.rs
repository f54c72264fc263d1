/*!
 * Expression Result
 * Three-valued outcome of evaluating an expression
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome status
///
/// `Deferred` means the expression holds an operation check pinned to the other
/// evaluation phase. It is never a final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Deferred,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Deferred => "DEFERRED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus an optional human-readable failure reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionResult {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExpressionResult {
    pub const PASS: Self = Self {
        status: Status::Pass,
        reason: None,
    };

    pub const FAIL: Self = Self {
        status: Status::Fail,
        reason: None,
    };

    pub const DEFERRED: Self = Self {
        status: Status::Deferred,
        reason: None,
    };

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            reason: Some(reason.into()),
        }
    }

    #[inline]
    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }

    #[inline]
    pub fn is_fail(&self) -> bool {
        self.status == Status::Fail
    }

    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.status == Status::Deferred
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl From<Status> for ExpressionResult {
    fn from(status: Status) -> Self {
        Self {
            status,
            reason: None,
        }
    }
}

impl fmt::Display for ExpressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.status, reason),
            None => write!(f, "{}", self.status),
        }
    }
}
