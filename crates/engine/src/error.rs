//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`MemberNotFound`] thrown when a supplement references an unknown member.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`InvalidRecord`] thrown when a store payload cannot be decoded.
//!
//!  [`MemberNotFound`]: EngineError::MemberNotFound
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidRecord`]: EngineError::InvalidRecord
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Selected member not found!")]
    MemberNotFound(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MemberNotFound(a), Self::MemberNotFound(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidPhoto(a), Self::InvalidPhoto(b)) => a == b,
            (Self::InvalidRecord(a), Self::InvalidRecord(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidRecord(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_not_found_renders_operator_message() {
        let err = EngineError::MemberNotFound("KV0042".to_string());
        assert_eq!(err.to_string(), "Selected member not found!");
    }

    #[test]
    fn equality_compares_variant_and_payload() {
        assert_eq!(
            EngineError::KeyNotFound("a".to_string()),
            EngineError::KeyNotFound("a".to_string())
        );
        assert_ne!(
            EngineError::KeyNotFound("a".to_string()),
            EngineError::MemberNotFound("a".to_string())
        );
    }
}
