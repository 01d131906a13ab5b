//! Error type returned by [`crate::Protector::protect`] and option parsing.
//!
//! Storage failures never surface here: quota and availability problems are
//! absorbed by the lifecycle (see [`crate::storage::StorageError`]). What
//! remains are caller mistakes that would otherwise corrupt the key space.

/// Errors raised before any field is bound.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A target has no stable identifier, so its keys would collide with
    /// every other anonymous form on the page.
    #[error("target at index {index} has no id; storage keys would collide")]
    MissingTargetId { index: usize },
    /// Options parsed but carry an out-of-range value.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// Options JSON could not be decoded.
    #[error("failed to parse options: {0}")]
    OptionsParse(#[from] serde_json::Error),
}
