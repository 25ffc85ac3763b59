//! # Container Capability
//!
//! The two-operation interface every composite shape provides:
//!
//! - `traverse` visits each child in a fixed order, lets the caller replace
//!   it while threading an accumulator, and rebuilds a composite of the same
//!   shape.
//! - `reduce` visits the same children in the same order and folds them
//!   into the accumulator without rebuilding anything.
//!
//! Traversal is one level deep. A child that is itself a composite is
//! handed to the caller's function as-is; recursing is the function's
//! decision (see [`crate::composite`]).
//!
//! Built-in implementations live here: [`Tuple`] visits positions left to
//! right, keyed mappings visit values in ascending key order regardless of
//! the map's internal order. Derived records are handled by
//! [`crate::derive::Derivation`].
//!
//! A caller's error is returned unmodified and stops the walk at once; no
//! partial composite and no accumulator survive it.

use std::collections::HashMap;

use tensa_core::{Key, Tuple, Value};

/// A composite shape that can be traversed and reduced.
///
/// The caller's function receives each child by reference; the input
/// composite is never mutated.
pub trait Container<L> {
    /// The composite produced by `traverse`; same shape as `Self`.
    type Output;

    /// Visit every child in order, replacing each with the function's result.
    fn traverse<'a, A, E, F>(&'a self, acc: A, f: F) -> Result<(Self::Output, A), E>
    where
        L: 'a,
        F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>;

    /// Visit every child in order, folding into the accumulator.
    fn reduce<'a, A, E, F>(&'a self, acc: A, f: F) -> Result<A, E>
    where
        L: 'a,
        F: FnMut(&'a Value<L>, A) -> Result<A, E>;
}

impl<L> Container<L> for Tuple<L> {
    type Output = Tuple<L>;

    fn traverse<'a, A, E, F>(&'a self, acc: A, mut f: F) -> Result<(Tuple<L>, A), E>
    where
        L: 'a,
        F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
    {
        let mut elements = Vec::with_capacity(self.arity());
        let mut acc = acc;
        for element in self.iter() {
            let (replaced, next) = f(element, acc)?;
            elements.push(replaced);
            acc = next;
        }
        Ok((Tuple::new(elements), acc))
    }

    fn reduce<'a, A, E, F>(&'a self, acc: A, mut f: F) -> Result<A, E>
    where
        L: 'a,
        F: FnMut(&'a Value<L>, A) -> Result<A, E>,
    {
        self.iter().try_fold(acc, |acc, element| f(element, acc))
    }
}

impl<L> Container<L> for HashMap<Key, Value<L>> {
    type Output = HashMap<Key, Value<L>>;

    fn traverse<'a, A, E, F>(&'a self, acc: A, mut f: F) -> Result<(Self::Output, A), E>
    where
        L: 'a,
        F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
    {
        let mut rebuilt = HashMap::with_capacity(self.len());
        let mut acc = acc;
        for (key, value) in sorted_entries(self) {
            let (replaced, next) = f(value, acc)?;
            rebuilt.insert(key.clone(), replaced);
            acc = next;
        }
        Ok((rebuilt, acc))
    }

    fn reduce<'a, A, E, F>(&'a self, acc: A, mut f: F) -> Result<A, E>
    where
        L: 'a,
        F: FnMut(&'a Value<L>, A) -> Result<A, E>,
    {
        sorted_entries(self)
            .into_iter()
            .try_fold(acc, |acc, (_, value)| f(value, acc))
    }
}

/// Entries of a keyed mapping in ascending key order.
pub fn sorted_entries<L>(map: &HashMap<Key, Value<L>>) -> Vec<(&Key, &Value<L>)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}
