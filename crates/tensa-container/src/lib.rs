//! # tensa-container — Container Capability
//!
//! Structural traversal over composite argument values: locate the leaves
//! inside fixed sequences, keyed mappings and user record types, and either
//! rebuild the composite with each leaf replaced (`traverse`) or fold the
//! leaves into an accumulator (`reduce`).
//!
//! - **Capability** (`capability.rs`): the [`Container`] trait and the
//!   built-in tuple and map implementations.
//!
//! - **Derivation** (`derive.rs`): field classification for record types.
//!   [`DeriveOptions`] names the `containers` (visited, in order) and `keep`
//!   (preserved) fields; every other field is reset to its default on
//!   traversal.
//!
//! - **Registry** (`registry.rs`): [`ContainerRegistry`] holds one
//!   [`Derivation`] per record type and dispatches any [`Value`] to its
//!   capability, or fails with `ContainerError::UnsupportedShape`.
//!
//! - **Composite** (`composite.rs`): deep traversal, flattening, structural
//!   compatibility and fingerprints built on the one-level capability.
//!
//! ## Ordering Invariant
//!
//! Visitation order is a function of the value alone: tuple positions left
//! to right, map values by ascending key, record container fields in the
//! order they were declared. Downstream caches key compiled artifacts on
//! this order.
//!
//! ## Example
//!
//! ```
//! use tensa_container::{ContainerRegistry, DeriveOptions};
//! use tensa_core::{ContainerError, Record, RecordType, Value};
//!
//! let point = RecordType::<i64>::builder("Point")
//!     .field("x", Value::Nil)
//!     .field("tag", Value::Nil)
//!     .field("meta", Value::Int(0))
//!     .build()?;
//!
//! let mut registry = ContainerRegistry::new();
//! registry.derive(&point, &DeriveOptions::containers(["x"]).keep(["tag"]))?;
//!
//! let value = Value::Record(
//!     Record::new(&point)
//!         .with("x", Value::Leaf(5))?
//!         .with("tag", Value::Str("k".into()))?
//!         .with("meta", Value::Int(99))?,
//! );
//! let (doubled, visits) = registry.traverse(&value, 0, |leaf, n| match leaf {
//!     Value::Leaf(x) => Ok::<_, ContainerError>((Value::Leaf(x * 2), n + 1)),
//!     other => Ok((other.clone(), n + 1)),
//! })?;
//!
//! let doubled = doubled.as_record().expect("record in, record out");
//! assert_eq!(doubled.get("x"), Some(&Value::Leaf(10)));
//! assert_eq!(doubled.get("tag"), Some(&Value::Str("k".into())));
//! assert_eq!(doubled.get("meta"), Some(&Value::Int(0)));
//! assert_eq!(visits, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod capability;
pub mod composite;
pub mod derive;
pub mod registry;

pub use capability::Container;
pub use composite::{compatible, count, deep_reduce, deep_traverse, fingerprint, flatten, is_leaf};
pub use derive::{DeriveOptions, Derivation, FieldClass};
pub use registry::{Capability, ContainerRegistry};
