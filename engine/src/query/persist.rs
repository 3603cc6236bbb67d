//! Saved filter documents
//!
//! A saved filter is a [`QueryGroup`] serialized as JSON, with every value
//! wrapped in its codec envelope. Loading validates size and nesting before
//! the tree is handed to the compiler.

use serde_json::Value;
use thiserror::Error;

use super::codec::{DecodeError, decode};
use super::rule::QueryGroup;

/// Maximum size of a filter document in bytes (64KB)
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024;

/// Maximum group nesting depth
pub const MAX_GROUP_DEPTH: usize = 32;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Filter document is {size} bytes, maximum is {max}")]
    TooLarge { size: usize, max: usize },

    /// Invalid JSON or a document that is not a filter tree
    #[error("Invalid filter document: {0}")]
    Json(#[from] serde_json::Error),

    /// A filter value with a missing, unknown or mis-typed envelope
    #[error("Invalid filter value: {0}")]
    Decode(#[from] DecodeError),

    #[error("Filter groups nested {depth} deep, maximum is {max}")]
    TooDeep { depth: usize, max: usize },
}

/// Serialize a filter tree
pub fn save_group(group: &QueryGroup) -> Result<String, PersistError> {
    Ok(serde_json::to_string(group)?)
}

/// Serialize a filter tree with indentation
pub fn save_group_pretty(group: &QueryGroup) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(group)?)
}

/// Parse and validate a saved filter tree
pub fn load_group(json: &str) -> Result<QueryGroup, PersistError> {
    if json.len() > MAX_DOCUMENT_SIZE {
        return Err(PersistError::TooLarge {
            size: json.len(),
            max: MAX_DOCUMENT_SIZE,
        });
    }

    let raw: Value = serde_json::from_str(json)?;
    check_values(&raw)?;
    let group: QueryGroup = serde_json::from_value(raw)?;

    let depth = group.depth();
    if depth > MAX_GROUP_DEPTH {
        return Err(PersistError::TooDeep {
            depth,
            max: MAX_GROUP_DEPTH,
        });
    }

    tracing::debug!(
        filters = group.filters.len(),
        depth,
        "Loaded filter document"
    );
    Ok(group)
}

/// Decode every filter value so envelope failures keep their type
fn check_values(node: &Value) -> Result<(), DecodeError> {
    let Some(filters) = node.get("filters").and_then(Value::as_array) else {
        return Ok(());
    };

    for rule in filters {
        if let Some(value) = rule.get("value") {
            decode(value)?;
        }
        check_values(rule)?;
    }
    Ok(())
}

/// Like [`load_group`], but an unreadable document becomes an empty filter
pub fn load_group_or_default(json: &str) -> QueryGroup {
    load_group(json).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not restore saved filter, starting empty");
        QueryGroup::default()
    })
}
