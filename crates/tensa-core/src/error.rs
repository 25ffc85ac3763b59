//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout tensa. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Configuration errors are raised while a record type is declared or
//!   derived. Nothing is registered when one is returned.
//! - Container errors are raised at call time, before any leaf is visited.
//! - Errors produced by a caller's transform function are never wrapped by
//!   this crate. Traversal entry points are generic over the caller's error
//!   type and only require `E: From<ContainerError>`.

use thiserror::Error;

/// Top-level error type for tensa.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensaError {
    /// Record type declaration or container derivation rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Traversal dispatch failed.
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// Canonicalization for fingerprinting failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Definition-time error: a record type or its container derivation is
/// malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A name listed in `containers` or `keep` is not a field of the type.
    #[error("unknown field `{field}` given to `{option}` when deriving the container capability for `{type_name}`")]
    UnknownField {
        /// The record type being derived.
        type_name: String,
        /// The offending field name.
        field: String,
        /// The option the name was listed under.
        option: &'static str,
    },

    /// A field is listed in both `containers` and `keep`.
    #[error("field `{field}` of `{type_name}` is listed in both `containers` and `keep`")]
    OverlappingField {
        /// The record type being derived.
        type_name: String,
        /// The field listed twice.
        field: String,
    },

    /// A field is listed more than once in the same option.
    #[error("field `{field}` is listed more than once in `{option}` for `{type_name}`")]
    DuplicateEntry {
        /// The record type being derived.
        type_name: String,
        /// The repeated field name.
        field: String,
        /// The option containing the repetition.
        option: &'static str,
    },

    /// The record type already carries a derived container capability.
    #[error("record type `{type_name}` already has a derived container capability")]
    AlreadyDerived {
        /// The record type.
        type_name: String,
    },

    /// A record type declares the same field twice.
    #[error("record type `{type_name}` declares field `{field}` more than once")]
    DuplicateField {
        /// The record type.
        type_name: String,
        /// The repeated field name.
        field: String,
    },

    /// A type or field name is malformed.
    #[error("invalid {kind} name {name:?}: {reason}")]
    InvalidName {
        /// `"type"` or `"field"`.
        kind: &'static str,
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Derive options could not be parsed.
    #[error("invalid derive options: {0}")]
    Options(String),
}

/// Call-time error raised by traversal dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No container capability is installed for the value's shape.
    #[error("the container capability is not implemented for {shape}; implement it or derive it with a `containers` field list (and optional `keep` list) before traversing")]
    UnsupportedShape {
        /// Description of the offending shape, e.g. `record Point` or `leaf`.
        shape: String,
    },

    /// A record instance was addressed with a field its type does not declare.
    #[error("record type `{type_name}` has no field `{field}`")]
    NoSuchField {
        /// The record type.
        type_name: String,
        /// The field that was requested.
        field: String,
    },

    /// A record was assembled from a value list that does not match its
    /// type's field count.
    #[error("record type `{type_name}` declares {expected} fields but {found} values were supplied")]
    FieldCount {
        /// The record type.
        type_name: String,
        /// Number of declared fields.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanonicalizationError {
    /// Non-finite floats have no canonical JSON representation.
    #[error("non-finite float {0} has no canonical representation")]
    NonFiniteFloat(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

impl From<serde_json::Error> for CanonicalizationError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}
