use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// Transient message shown to the operator after an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

impl From<&EngineError> for Notification {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::Database(_) | EngineError::Store(_) => {
                Self::error("Something went wrong, please retry.")
            }
            other => Self::error(other.to_string()),
        }
    }
}

/// Result of a successful domain operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub notification: Notification,
}

impl<T> Outcome<T> {
    pub(crate) fn new(value: T, message: &str) -> Self {
        Self {
            value,
            notification: Notification::success(message),
        }
    }
}
