//! # Name Newtypes
//!
//! Validated wrappers for record type names and field names. A `FieldName`
//! cannot be passed where a `TypeName` is expected, and neither can be built
//! from an arbitrary string without going through validation.
//!
//! Names follow identifier rules: ASCII letters, digits and `_`, not starting
//! with a digit. Type names may additionally carry a module path with `::`
//! separators (`layers::Dense`).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of a user-declared record type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

/// Name of a field within a record type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl TypeName {
    /// Validate and wrap a type name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(invalid("type", name, "must not be empty"));
        }
        for segment in name.split("::") {
            if let Err(reason) = check_identifier(segment) {
                return Err(invalid("type", name, reason));
            }
        }
        Ok(Self(name))
    }

    /// Access the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FieldName {
    /// Validate and wrap a field name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        match check_identifier(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(invalid("field", name, reason)),
        }
    }

    /// Access the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(kind: &'static str, name: String, reason: &'static str) -> ConfigError {
    ConfigError::InvalidName { kind, name, reason }
}

fn check_identifier(segment: &str) -> Result<(), &'static str> {
    let mut chars = segment.chars();
    match chars.next() {
        None => Err("must not contain empty segments"),
        Some(c) if c.is_ascii_digit() => Err("must not start with a digit"),
        Some(c) if !(c.is_ascii_alphanumeric() || c == '_') => {
            Err("may only contain ASCII letters, digits and `_`")
        }
        Some(_) => {
            if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                Ok(())
            } else {
                Err("may only contain ASCII letters, digits and `_`")
            }
        }
    }
}

macro_rules! name_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ConfigError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = ConfigError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

name_impls!(TypeName);
name_impls!(FieldName);
