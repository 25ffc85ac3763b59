//! # Composite Helpers
//!
//! Deep operations an expression compiler needs on arbitrary argument
//! values, built only from the one-level capability in
//! [`ContainerRegistry`]. Nothing here knows how a tuple, map or record is
//! laid out; the recursion just keeps dispatching until it reaches a
//! terminal value.
//!
//! Terminal values are `Value::Leaf`, `Value::Int` and `Value::Float`: numbers
//! are treated as scalar tensors. Any other non-composite value reached
//! during recursion is an unsupported shape.

use serde::Serialize;
use serde_json::{json, Number};

use tensa_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContainerError, ContentDigest, Record,
    TensaError, Value,
};

use crate::capability::sorted_entries;
use crate::registry::{Capability, ContainerRegistry};

/// Returns true for values the deep helpers hand to the caller's function.
pub fn is_leaf<L>(value: &Value<L>) -> bool {
    matches!(value, Value::Leaf(_) | Value::Int(_) | Value::Float(_))
}

/// Traverse every terminal value reachable from `value`, rebuilding each
/// composite level on the way back up.
///
/// A terminal `value` is passed to `f` directly.
pub fn deep_traverse<'a, L, A, E, F>(
    registry: &'a ContainerRegistry<L>,
    value: &'a Value<L>,
    acc: A,
    mut f: F,
) -> Result<(Value<L>, A), E>
where
    L: Clone,
    E: From<ContainerError>,
    F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
{
    deep_traverse_with(registry, value, acc, &mut f)
}

fn deep_traverse_with<'a, L, A, E, F>(
    registry: &'a ContainerRegistry<L>,
    value: &'a Value<L>,
    acc: A,
    f: &mut F,
) -> Result<(Value<L>, A), E>
where
    L: Clone,
    E: From<ContainerError>,
    F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
{
    if is_leaf(value) {
        return f(value, acc);
    }
    registry.traverse(value, acc, |child, acc| deep_traverse_with(registry, child, acc, &mut *f))
}

/// Fold every terminal value reachable from `value`, in visitation order.
pub fn deep_reduce<'a, L, A, E, F>(
    registry: &'a ContainerRegistry<L>,
    value: &'a Value<L>,
    acc: A,
    mut f: F,
) -> Result<A, E>
where
    E: From<ContainerError>,
    F: FnMut(&'a Value<L>, A) -> Result<A, E>,
{
    deep_reduce_with(registry, value, acc, &mut f)
}

fn deep_reduce_with<'a, L, A, E, F>(
    registry: &'a ContainerRegistry<L>,
    value: &'a Value<L>,
    acc: A,
    f: &mut F,
) -> Result<A, E>
where
    E: From<ContainerError>,
    F: FnMut(&'a Value<L>, A) -> Result<A, E>,
{
    if is_leaf(value) {
        return f(value, acc);
    }
    registry.reduce(value, acc, |child, acc| deep_reduce_with(registry, child, acc, &mut *f))
}

/// Terminal values of `value` in visitation order.
pub fn flatten<'a, L>(
    registry: &'a ContainerRegistry<L>,
    value: &'a Value<L>,
) -> Result<Vec<&'a Value<L>>, ContainerError> {
    deep_reduce(registry, value, Vec::new(), |leaf, mut leaves| {
        leaves.push(leaf);
        Ok(leaves)
    })
}

/// Number of terminal values reachable from `value`.
pub fn count<L>(registry: &ContainerRegistry<L>, value: &Value<L>) -> Result<usize, ContainerError> {
    deep_reduce(registry, value, 0, |_, n| Ok(n + 1))
}

/// Returns true if both values have the same composite structure and
/// `leaf_compatible` accepts every pair of terminals.
///
/// Structure means: same composite variants at every level, same tuple
/// arity, same map key sets, same record type with equal kept fields.
///
/// # Errors
///
/// Returns `ContainerError::UnsupportedShape` if either side contains a
/// value with no container capability.
pub fn compatible<L, F>(
    registry: &ContainerRegistry<L>,
    left: &Value<L>,
    right: &Value<L>,
    mut leaf_compatible: F,
) -> Result<bool, ContainerError>
where
    L: PartialEq,
    F: FnMut(&Value<L>, &Value<L>) -> bool,
{
    compatible_with(registry, left, right, &mut leaf_compatible)
}

fn compatible_with<L, F>(
    registry: &ContainerRegistry<L>,
    left: &Value<L>,
    right: &Value<L>,
    leaf_compatible: &mut F,
) -> Result<bool, ContainerError>
where
    L: PartialEq,
    F: FnMut(&Value<L>, &Value<L>) -> bool,
{
    match (is_leaf(left), is_leaf(right)) {
        (true, true) => return Ok(leaf_compatible(left, right)),
        (true, false) => {
            registry.capability(right)?;
            return Ok(false);
        }
        (false, true) => {
            registry.capability(left)?;
            return Ok(false);
        }
        (false, false) => {}
    }

    let same_structure = match (registry.capability(left)?, registry.capability(right)?) {
        (Capability::FixedSequence(a), Capability::FixedSequence(b)) => a.arity() == b.arity(),
        (Capability::KeyedMapping(a), Capability::KeyedMapping(b)) => {
            a.len() == b.len() && a.keys().all(|k| b.contains_key(k))
        }
        (Capability::Derived(derivation, a), Capability::Derived(_, b)) => {
            a.record_type().same_layout(b.record_type())
                && derivation
                    .kept_positions()
                    .iter()
                    .all(|&i| a.values().get(i) == b.values().get(i))
        }
        _ => false,
    };
    if !same_structure {
        return Ok(false);
    }

    let left_children = children(registry, left)?;
    let right_children = children(registry, right)?;
    for (l, r) in left_children.into_iter().zip(right_children) {
        if !compatible_with(registry, l, r, leaf_compatible)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn children<'a, L>(
    registry: &'a ContainerRegistry<L>,
    value: &'a Value<L>,
) -> Result<Vec<&'a Value<L>>, ContainerError> {
    registry.reduce(value, Vec::new(), |child, mut out| {
        out.push(child);
        Ok(out)
    })
}

/// Content digest identifying `value` for compilation caching.
///
/// Covers the composite structure, every terminal value in visitation
/// order, and the values of kept record fields. Default record fields never
/// contribute. Two maps with the same entries produce the same fingerprint
/// whatever order they were built in.
///
/// # Errors
///
/// Returns `TensaError::Container` for unsupported shapes and
/// `TensaError::Canonicalization` if a leaf cannot be serialized or a
/// float is not finite.
pub fn fingerprint<L>(registry: &ContainerRegistry<L>, value: &Value<L>) -> Result<ContentDigest, TensaError>
where
    L: Serialize,
{
    let description = describe(registry, value)?;
    let bytes = CanonicalBytes::from_value(&description)?;
    Ok(sha256_digest(&bytes))
}

fn describe<L: Serialize>(
    registry: &ContainerRegistry<L>,
    value: &Value<L>,
) -> Result<serde_json::Value, TensaError> {
    if is_leaf(value) {
        return encode(value);
    }
    match registry.capability(value)? {
        Capability::FixedSequence(tuple) => {
            let elements = tuple
                .iter()
                .map(|element| describe(registry, element))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(json!({ "tuple": elements }))
        }
        Capability::KeyedMapping(map) => {
            let entries = sorted_entries(map)
                .into_iter()
                .map(|(key, child)| {
                    let child = describe(registry, child)?;
                    Ok(json!([key, child]))
                })
                .collect::<Result<Vec<_>, TensaError>>()?;
            Ok(json!({ "map": entries }))
        }
        Capability::Derived(derivation, record) => {
            let containers = derivation
                .container_positions()
                .iter()
                .filter_map(|&i| describe_field(record, i))
                .map(|(name, child)| {
                    let child = describe(registry, child)?;
                    Ok(json!([name, child]))
                })
                .collect::<Result<Vec<_>, TensaError>>()?;
            let keep = derivation
                .kept_positions()
                .iter()
                .filter_map(|&i| describe_field(record, i))
                .map(|(name, kept)| {
                    let kept = encode(kept)?;
                    Ok(json!([name, kept]))
                })
                .collect::<Result<Vec<_>, TensaError>>()?;
            Ok(json!({
                "record": record.type_name().as_str(),
                "containers": containers,
                "keep": keep,
            }))
        }
    }
}

fn describe_field<L>(record: &Record<L>, index: usize) -> Option<(&str, &Value<L>)> {
    let field = record.record_type().fields().get(index)?;
    let value = record.values().get(index)?;
    Some((field.name().as_str(), value))
}

/// Structural encoding of any value, independent of the registry. Used for
/// terminals and for kept fields, which are compared by value.
fn encode<L: Serialize>(value: &Value<L>) -> Result<serde_json::Value, TensaError> {
    Ok(match value {
        Value::Nil => json!({ "nil": null }),
        Value::Bool(b) => json!({ "bool": b }),
        Value::Int(i) => json!({ "int": i }),
        Value::Float(x) => {
            let n = Number::from_f64(*x).ok_or(CanonicalizationError::NonFiniteFloat(*x))?;
            json!({ "float": n })
        }
        Value::Str(s) => json!({ "str": s }),
        Value::Leaf(leaf) => {
            let leaf = serde_json::to_value(leaf).map_err(CanonicalizationError::from)?;
            json!({ "leaf": leaf })
        }
        Value::Tuple(tuple) => {
            let elements = tuple.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
            json!({ "tuple": elements })
        }
        Value::Map(map) => {
            let entries = sorted_entries(map)
                .into_iter()
                .map(|(key, child)| {
                    let child = encode(child)?;
                    Ok(json!([key, child]))
                })
                .collect::<Result<Vec<_>, TensaError>>()?;
            json!({ "map": entries })
        }
        Value::Record(record) => {
            let fields = record
                .fields()
                .map(|(name, child)| {
                    let child = encode(child)?;
                    Ok(json!([name.as_str(), child]))
                })
                .collect::<Result<Vec<_>, TensaError>>()?;
            json!({ "record": record.type_name().as_str(), "fields": fields })
        }
    })
}
