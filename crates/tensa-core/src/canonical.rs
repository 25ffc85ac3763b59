//! # Canonical Serialization — JCS Byte Production
//!
//! `CanonicalBytes` is the only input accepted by the digest functions.
//! Composite fingerprints are computed from a JSON description of the
//! composite; two descriptions that are equal as JSON values must hash
//! identically regardless of how their objects were built, so serialization
//! goes through RFC 8785 (JSON Canonicalization Scheme): sorted keys,
//! compact separators, deterministic number formatting.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructors are [`CanonicalBytes::new`] and
///   [`CanonicalBytes::from_value`].
/// - Object keys are sorted, separators are compact.
/// - The inner `Vec<u8>` is private and valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(&value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: &Value) -> Result<Self, CanonicalizationError> {
        let s = serde_jcs::to_string(value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,20}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Same input always produces the same bytes.
        #[test]
        fn canonical_bytes_deterministic(value in json_value()) {
            let a = CanonicalBytes::from_value(&value).unwrap();
            let b = CanonicalBytes::from_value(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Canonical output parses back to the same JSON value.
        #[test]
        fn canonical_bytes_valid_json(value in json_value()) {
            let cb = CanonicalBytes::from_value(&value).unwrap();
            let parsed: Value = serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, value);
        }
    }
}
