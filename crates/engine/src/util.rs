//! Internal helpers for record validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every domain operation enforces the same input rules.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, Money, ResultEngine};

/// Key the sync layer attaches to every node for its own bookkeeping.
const METADATA_KEY: &str = "_";

/// Trim and NFC-normalize a required display name.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(normalized)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn ensure_non_negative(amount: Money, label: &str) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be >= 0, got {amount}"
        )));
    }
    Ok(())
}

/// Accept a captured photo as a `data:` URL or bare base64 payload.
///
/// The image itself stays opaque; only the base64 body is checked.
pub(crate) fn validate_photo(photo: &str) -> ResultEngine<String> {
    let trimmed = photo.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, body)| body)
            .ok_or_else(|| EngineError::InvalidPhoto("data URL must be base64".to_string()))?,
        None => trimmed,
    };
    if body.is_empty() {
        return Err(EngineError::InvalidPhoto("empty image".to_string()));
    }
    STANDARD
        .decode(body)
        .map_err(|err| EngineError::InvalidPhoto(err.to_string()))?;
    Ok(trimmed.to_string())
}

/// Remove sync metadata from a node and force its id to the store key.
pub(crate) fn clean_node(mut value: Value, key: &str) -> ResultEngine<Value> {
    let Some(fields) = value.as_object_mut() else {
        return Err(EngineError::InvalidRecord(format!(
            "node {key} is not a flat record"
        )));
    };
    fields.remove(METADATA_KEY);
    fields.insert("id".to_string(), Value::String(key.to_string()));
    Ok(value)
}
