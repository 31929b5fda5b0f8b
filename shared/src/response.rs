//! Reply classification and acknowledgment checks

use std::fmt;
use thiserror::Error;

/// Failure raised when a required command was not acknowledged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AckError {
    #[error("{context}: expected ok, drone replied {response:?}")]
    Rejected { context: String, response: String },

    #[error("{context}: expected ok, no response before timeout")]
    NoResponse { context: String },
}

impl AckError {
    /// The label of the step that failed
    pub fn context(&self) -> &str {
        match self {
            AckError::Rejected { context, .. } | AckError::NoResponse { context } => context,
        }
    }
}

/// A classified reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Literal `ok`
    Ok,
    /// Literal `error`
    Error,
    /// Anything else, typically a telemetry value
    Value(String),
}

impl Response {
    /// Classify a reply line. Only the exact tokens count as `ok`/`error`.
    pub fn classify(line: &str) -> Self {
        match line {
            "ok" => Response::Ok,
            "error" => Response::Error,
            other => Response::Value(other.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "ok"),
            Response::Error => write!(f, "error"),
            Response::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Fail unless `response` is exactly `ok`
pub fn require_ok(response: Option<&str>, context: &str) -> Result<(), AckError> {
    match response {
        Some("ok") => Ok(()),
        Some(other) => Err(AckError::Rejected {
            context: context.to_string(),
            response: other.to_string(),
        }),
        None => Err(AckError::NoResponse {
            context: context.to_string(),
        }),
    }
}
