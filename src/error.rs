//! Error types for the stub generator.
//!
//! Descriptor problems are programmer errors and fail fast through
//! [`GenerateError`]. Value problems are recoverable and surface as
//! [`SerializeError`], which the generator turns into diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("class descriptor has an empty class name")]
    EmptyClassName,

    #[error("class `{class}` declares a member with an empty name")]
    EmptyMemberName { class: String },

    #[error("class `{class}` declares member `{member}` more than once")]
    DuplicateMember { class: String, member: String },

    #[error("selector of `{member}` repeats parameter `{slot}`")]
    DuplicateSlot { member: String, slot: String },

    #[error("invalid class descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),

    #[error("invalid property snapshot: {0}")]
    InvalidSnapshot(serde_json::Error),

    #[error("generated module is not valid script:\n{}", .0.join("\n"))]
    InvalidOutput(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("non-finite number `{0}` has no JSON encoding")]
    NonFinite(String),

    #[error("opaque native value `{0}` has no structured encoding")]
    Opaque(String),

    #[error("JSON encoding failed: {0}")]
    Json(String),
}
