//! # tensa-core — Foundational Types for tensa
//!
//! Defines the value model the traversal layer walks, the record type
//! declarations user code opts in with, and the error hierarchy shared by
//! the workspace. `tensa-container` builds the container capability on top
//! of these types.
//!
//! ## Key Design Principles
//!
//! 1. **Leaves are opaque.** [`Value`] is generic over the caller's leaf
//!    type `L`. Nothing in this workspace inspects a leaf.
//!
//! 2. **Validated names.** [`TypeName`] and [`FieldName`] are newtypes with
//!    validating constructors. No bare strings for identifiers once a
//!    declaration has been accepted.
//!
//! 3. **Record types are declared once.** [`RecordType::builder`] validates
//!    the declaration and returns a shared, immutable `Arc<RecordType<L>>`.
//!
//! 4. **Digests only from canonical bytes.** [`sha256_digest`] accepts only
//!    [`CanonicalBytes`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tensa-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod name;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ConfigError, ContainerError, TensaError};
pub use name::{FieldName, TypeName};
pub use value::{FieldDef, Key, Record, RecordType, RecordTypeBuilder, Tuple, Value};
