//! # Container Registry
//!
//! The type-indexed table of derived record capabilities, and the single
//! entry point for shape dispatch on a [`Value`].
//!
//! Dispatch resolves a value to a [`Capability`]:
//!
//! - `Value::Tuple` → fixed sequence, positions left to right.
//! - `Value::Map` → keyed mapping, ascending key order.
//! - `Value::Record` whose type has been derived → the type's [`Derivation`].
//!
//! Every other value falls back to `ContainerError::UnsupportedShape`
//! before the caller's function is ever invoked.
//!
//! Registration takes `&mut self`; traversal takes `&self`. A registry that
//! has been populated can be shared across threads and traversed
//! concurrently without coordination.

use std::collections::HashMap;
use std::sync::Arc;

use tensa_core::{ConfigError, ContainerError, Key, Record, RecordType, Tuple, TypeName, Value};

use crate::capability::Container;
use crate::derive::{DeriveOptions, Derivation};

/// Registry of derived record capabilities keyed by type name.
#[derive(Debug, Clone)]
pub struct ContainerRegistry<L> {
    derivations: HashMap<TypeName, Arc<Derivation<L>>>,
}

impl<L> Default for ContainerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> ContainerRegistry<L> {
    /// An empty registry. Tuples and maps are supported without registration.
    pub fn new() -> Self {
        Self {
            derivations: HashMap::new(),
        }
    }

    /// Derive and install the container capability for `record_type`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AlreadyDerived` if the type name is already
    /// registered, or any error from [`Derivation::new`]. Nothing is
    /// registered when an error is returned.
    pub fn derive(
        &mut self,
        record_type: &Arc<RecordType<L>>,
        options: &DeriveOptions,
    ) -> Result<Arc<Derivation<L>>, ConfigError> {
        let type_name = record_type.name();
        if self.derivations.contains_key(type_name) {
            let err = ConfigError::AlreadyDerived {
                type_name: type_name.to_string(),
            };
            tracing::warn!(type_name = %type_name, error = %err, "container derivation rejected");
            return Err(err);
        }

        let derivation = match Derivation::new(record_type, options) {
            Ok(derivation) => Arc::new(derivation),
            Err(err) => {
                tracing::warn!(type_name = %type_name, error = %err, "container derivation rejected");
                return Err(err);
            }
        };

        tracing::debug!(
            type_name = %type_name,
            containers = ?options.containers,
            keep = ?options.keep,
            "container capability derived"
        );
        self.derivations
            .insert(type_name.clone(), Arc::clone(&derivation));
        Ok(derivation)
    }

    /// The installed derivation for a type name.
    pub fn derivation(&self, type_name: &str) -> Option<&Arc<Derivation<L>>> {
        self.derivations.get(type_name)
    }

    /// Returns true if the type name has a derived capability.
    pub fn is_derived(&self, type_name: &str) -> bool {
        self.derivations.contains_key(type_name)
    }

    /// Number of derived record types.
    pub fn len(&self) -> usize {
        self.derivations.len()
    }

    /// Returns true if no record type has been derived.
    pub fn is_empty(&self) -> bool {
        self.derivations.is_empty()
    }

    /// Resolve the capability for a value's runtime shape.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::UnsupportedShape` for leaves, scalars,
    /// records whose type has not been derived and records whose field
    /// layout differs from the derived type of the same name.
    pub fn capability<'a>(&'a self, value: &'a Value<L>) -> Result<Capability<'a, L>, ContainerError> {
        match value {
            Value::Tuple(tuple) => Ok(Capability::FixedSequence(tuple)),
            Value::Map(map) => Ok(Capability::KeyedMapping(map)),
            Value::Record(record) => match self.derivations.get(record.type_name()) {
                Some(derivation) => {
                    if let Err(err) = derivation.check(record) {
                        tracing::debug!(type_name = %record.type_name(), "record layout differs from derived type");
                        return Err(err);
                    }
                    Ok(Capability::Derived(derivation.as_ref(), record))
                }
                None => Err(unsupported(value)),
            },
            _ => Err(unsupported(value)),
        }
    }

    /// Traverse one level of `value`, rebuilding a composite of the same shape.
    ///
    /// # Errors
    ///
    /// Returns the caller's error unmodified, or `ContainerError::UnsupportedShape`
    /// converted into it.
    pub fn traverse<'a, A, E, F>(&'a self, value: &'a Value<L>, acc: A, f: F) -> Result<(Value<L>, A), E>
    where
        L: Clone,
        E: From<ContainerError>,
        F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
    {
        self.capability(value)?.traverse(acc, f)
    }

    /// Fold one level of `value` into the accumulator without rebuilding.
    ///
    /// # Errors
    ///
    /// Same as [`traverse`](Self::traverse).
    pub fn reduce<'a, A, E, F>(&'a self, value: &'a Value<L>, acc: A, f: F) -> Result<A, E>
    where
        E: From<ContainerError>,
        F: FnMut(&'a Value<L>, A) -> Result<A, E>,
    {
        self.capability(value)?.reduce(acc, f)
    }
}

fn unsupported<L>(value: &Value<L>) -> ContainerError {
    let shape = value.shape();
    tracing::debug!(shape = %shape, "no container capability for value");
    ContainerError::UnsupportedShape { shape }
}

/// The resolved capability for one value.
#[derive(Debug)]
pub enum Capability<'a, L> {
    /// Ordered, fixed-arity sequence.
    FixedSequence(&'a Tuple<L>),
    /// Mapping visited in ascending key order.
    KeyedMapping(&'a HashMap<Key, Value<L>>),
    /// Record with an installed derivation.
    Derived(&'a Derivation<L>, &'a Record<L>),
}

impl<'a, L> Capability<'a, L> {
    /// Traverse the resolved composite.
    pub fn traverse<A, E, F>(self, acc: A, f: F) -> Result<(Value<L>, A), E>
    where
        L: Clone,
        E: From<ContainerError>,
        F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
    {
        match self {
            Self::FixedSequence(tuple) => {
                let (rebuilt, acc) = tuple.traverse(acc, f)?;
                Ok((Value::Tuple(rebuilt), acc))
            }
            Self::KeyedMapping(map) => {
                let (rebuilt, acc) = map.traverse(acc, f)?;
                Ok((Value::Map(rebuilt), acc))
            }
            Self::Derived(derivation, record) => {
                let (rebuilt, acc) = derivation.traverse(record, acc, f)?;
                Ok((Value::Record(rebuilt), acc))
            }
        }
    }

    /// Reduce the resolved composite.
    pub fn reduce<A, E, F>(self, acc: A, f: F) -> Result<A, E>
    where
        E: From<ContainerError>,
        F: FnMut(&'a Value<L>, A) -> Result<A, E>,
    {
        match self {
            Self::FixedSequence(tuple) => tuple.reduce(acc, f),
            Self::KeyedMapping(map) => map.reduce(acc, f),
            Self::Derived(derivation, record) => derivation.reduce(record, acc, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Arc<RecordType<i64>> {
        RecordType::builder("Point")
            .field("x", Value::Nil)
            .field("y", Value::Nil)
            .build()
            .unwrap()
    }

    fn count_children(registry: &ContainerRegistry<i64>, value: &Value<i64>) -> Result<usize, ContainerError> {
        registry.reduce(value, 0, |_, n| Ok(n + 1))
    }

    #[test]
    fn test_builtins_need_no_registration() {
        let registry = ContainerRegistry::<i64>::new();
        assert!(registry.is_empty());
        let t = Value::tuple([Value::Leaf(1), Value::Leaf(2)]);
        let m = Value::map([("a", Value::Leaf(1))]);
        assert_eq!(count_children(&registry, &t), Ok(2));
        assert_eq!(count_children(&registry, &m), Ok(1));
    }

    #[test]
    fn test_underived_record_is_unsupported() {
        let registry = ContainerRegistry::new();
        let value = Value::Record(Record::new(&point()));
        let err = count_children(&registry, &value).unwrap_err();
        assert_eq!(
            err,
            ContainerError::UnsupportedShape {
                shape: "record `Point`".into()
            }
        );
        assert!(err.to_string().contains("derive"));
    }

    #[test]
    fn test_same_name_other_layout_is_unsupported() {
        let mut registry = ContainerRegistry::new();
        registry.derive(&point(), &DeriveOptions::containers(["x"])).unwrap();
        let other = RecordType::<i64>::builder("Point")
            .field("z", Value::Leaf(1))
            .build()
            .unwrap();
        let value = Value::Record(Record::new(&other));
        assert!(matches!(
            registry.capability(&value),
            Err(ContainerError::UnsupportedShape { .. })
        ));
        assert!(matches!(
            count_children(&registry, &value),
            Err(ContainerError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_scalars_and_leaves_are_unsupported() {
        let registry = ContainerRegistry::<i64>::new();
        for value in [Value::Leaf(1), Value::Int(1), Value::Str("s".into()), Value::Nil] {
            let mut called = false;
            let result = registry.traverse(&value, (), |v, ()| {
                called = true;
                Ok::<_, ContainerError>((v.clone(), ()))
            });
            assert!(matches!(result, Err(ContainerError::UnsupportedShape { .. })));
            assert!(!called);
        }
    }

    #[test]
    fn test_derive_installs_capability() {
        let mut registry = ContainerRegistry::new();
        let t = point();
        registry
            .derive(&t, &DeriveOptions::containers(["y", "x"]))
            .unwrap();
        assert!(registry.is_derived("Point"));
        assert_eq!(registry.len(), 1);

        let value = Value::Record(
            Record::new(&t)
                .with("x", Value::Leaf(1))
                .unwrap()
                .with("y", Value::Leaf(2))
                .unwrap(),
        );
        let order = registry
            .reduce(&value, Vec::new(), |v, mut order| {
                order.push(v.clone());
                Ok::<_, ContainerError>(order)
            })
            .unwrap();
        assert_eq!(order, vec![Value::Leaf(2), Value::Leaf(1)]);
    }

    #[test]
    fn test_second_derivation_rejected() {
        let mut registry = ContainerRegistry::new();
        let t = point();
        registry.derive(&t, &DeriveOptions::containers(["x"])).unwrap();
        let err = registry
            .derive(&t, &DeriveOptions::containers(["y"]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::AlreadyDerived {
                type_name: "Point".into()
            }
        );
        let d = registry.derivation("Point").unwrap();
        assert_eq!(d.container_fields(), ["x"]);
    }

    #[test]
    fn test_failed_derivation_registers_nothing() {
        let mut registry = ContainerRegistry::new();
        let err = registry
            .derive(&point(), &DeriveOptions::containers(["z"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { .. }));
        assert!(!registry.is_derived("Point"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_traverse_rebuilds_same_variant() {
        let registry = ContainerRegistry::<i64>::new();
        let t = Value::tuple([Value::Leaf(1)]);
        let (out, ()) = registry
            .traverse(&t, (), |v, ()| Ok::<_, ContainerError>((v.clone(), ())))
            .unwrap();
        assert!(matches!(out, Value::Tuple(_)));
        let m = Value::map([(1i64, Value::Leaf(1))]);
        let (out, ()) = registry
            .traverse(&m, (), |v, ()| Ok::<_, ContainerError>((v.clone(), ())))
            .unwrap();
        assert_eq!(out, m);
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContainerRegistry<i64>>();
    }
}
