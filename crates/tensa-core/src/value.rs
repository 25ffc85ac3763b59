//! # Composite Value Model
//!
//! The runtime shapes the traversal layer dispatches on. A [`Value`] is
//! either a plain scalar, an opaque [`Value::Leaf`] (a tensor or tensor-like
//! value owned by the caller), or one of the composite shapes:
//!
//! - [`Tuple`]: ordered, fixed-arity sequence.
//! - `HashMap<Key, Value<L>>`: keyed mapping with unique [`Key`]s. Its
//!   iteration order is arbitrary; traversal sorts keys before visiting.
//! - [`Record`]: an instance of a user-declared [`RecordType`].
//!
//! Record types are declared once through [`RecordType::builder`] and shared
//! behind an `Arc`. Each field carries the type's own default value, which is
//! what a freshly constructed instance holds.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ContainerError};
use crate::name::{FieldName, TypeName};

/// A mapping key. Keys are totally ordered: all booleans sort before all
/// integers, which sort before all strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Boolean key.
    Bool(bool),
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A value of any shape known to the traversal layer.
///
/// `L` is the caller's leaf type. This crate never looks inside a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<L> {
    /// Absence of a value.
    Nil,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    Str(String),
    /// Opaque leaf supplied by the caller.
    Leaf(L),
    /// Fixed-arity ordered sequence.
    Tuple(Tuple<L>),
    /// Keyed mapping.
    Map(HashMap<Key, Value<L>>),
    /// Instance of a user-declared record type.
    Record(Record<L>),
}

impl<L> Value<L> {
    /// Build a tuple value from its elements.
    pub fn tuple(elements: impl IntoIterator<Item = Value<L>>) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    /// Build a map value from key/value pairs. Later duplicates replace
    /// earlier ones.
    pub fn map<K: Into<Key>>(entries: impl IntoIterator<Item = (K, Value<L>)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Human-readable description of the runtime shape, used in errors.
    pub fn shape(&self) -> String {
        match self {
            Self::Nil => "nil".to_owned(),
            Self::Bool(_) => "boolean".to_owned(),
            Self::Int(_) => "integer".to_owned(),
            Self::Float(_) => "float".to_owned(),
            Self::Str(_) => "string".to_owned(),
            Self::Leaf(_) => "leaf".to_owned(),
            Self::Tuple(t) => format!("tuple of arity {}", t.arity()),
            Self::Map(_) => "map".to_owned(),
            Self::Record(r) => format!("record `{}`", r.type_name()),
        }
    }

    /// Access the leaf, if this value is one.
    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Access the record, if this value is one.
    pub fn as_record(&self) -> Option<&Record<L>> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl<L> From<Tuple<L>> for Value<L> {
    fn from(value: Tuple<L>) -> Self {
        Self::Tuple(value)
    }
}

impl<L> From<Record<L>> for Value<L> {
    fn from(value: Record<L>) -> Self {
        Self::Record(value)
    }
}

impl<L> From<HashMap<Key, Value<L>>> for Value<L> {
    fn from(value: HashMap<Key, Value<L>>) -> Self {
        Self::Map(value)
    }
}

/// An ordered sequence whose arity is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple<L>(Box<[Value<L>]>);

impl<L> Tuple<L> {
    /// Build a tuple from its elements.
    pub fn new(elements: Vec<Value<L>>) -> Self {
        Self(elements.into_boxed_slice())
    }

    /// The zero-arity tuple.
    pub fn empty() -> Self {
        Self(Vec::new().into_boxed_slice())
    }

    /// Number of positions.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the zero-arity tuple.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&Value<L>> {
        self.0.get(index)
    }

    /// All elements, left to right.
    pub fn elements(&self) -> &[Value<L>] {
        &self.0
    }

    /// Iterate over the elements, left to right.
    pub fn iter(&self) -> std::slice::Iter<'_, Value<L>> {
        self.0.iter()
    }
}

impl<L> FromIterator<Value<L>> for Tuple<L> {
    fn from_iter<I: IntoIterator<Item = Value<L>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Declaration of a single record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef<L> {
    name: FieldName,
    default: Value<L>,
}

impl<L> FieldDef<L> {
    /// The field name.
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    /// The value a freshly constructed instance holds in this field.
    pub fn default_value(&self) -> &Value<L> {
        &self.default
    }
}

/// A user-declared record type: a name and an ordered list of fields with
/// their default values.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType<L> {
    name: TypeName,
    fields: Vec<FieldDef<L>>,
}

impl<L> RecordType<L> {
    /// Start declaring a record type.
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder<L> {
        RecordTypeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Field declarations in declaration order.
    pub fn fields(&self) -> &[FieldDef<L>] {
        &self.fields
    }

    /// Position of the named field, if the type declares it.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field)
    }

    /// Returns true if the type declares the named field.
    pub fn has_field(&self, field: &str) -> bool {
        self.field_index(field).is_some()
    }

    /// Returns true if both types have the same name and the same fields in
    /// the same order.
    pub fn same_layout(&self, other: &RecordType<L>) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name)
    }
}

/// Builder for [`RecordType`]. Validation happens in [`build`](Self::build).
#[derive(Debug)]
pub struct RecordTypeBuilder<L> {
    name: String,
    fields: Vec<(String, Value<L>)>,
}

impl<L> RecordTypeBuilder<L> {
    /// Declare a field with the value fresh instances hold.
    pub fn field(mut self, name: impl Into<String>, default: Value<L>) -> Self {
        self.fields.push((name.into(), default));
        self
    }

    /// Validate names and produce the shared record type.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidName` for a malformed type or field name
    /// and `ConfigError::DuplicateField` if a field is declared twice.
    pub fn build(self) -> Result<Arc<RecordType<L>>, ConfigError> {
        let name = TypeName::new(self.name)?;
        let mut fields: Vec<FieldDef<L>> = Vec::with_capacity(self.fields.len());
        for (field, default) in self.fields {
            let field = FieldName::new(field)?;
            if fields.iter().any(|f| f.name == field) {
                return Err(ConfigError::DuplicateField {
                    type_name: name.to_string(),
                    field: field.to_string(),
                });
            }
            fields.push(FieldDef {
                name: field,
                default,
            });
        }
        Ok(Arc::new(RecordType { name, fields }))
    }
}

/// An instance of a [`RecordType`]. Field values are stored in declaration
/// order.
#[derive(Debug, Clone)]
pub struct Record<L> {
    record_type: Arc<RecordType<L>>,
    values: Vec<Value<L>>,
}

impl<L: Clone> Record<L> {
    /// A fresh instance with every field at its default value.
    pub fn new(record_type: &Arc<RecordType<L>>) -> Self {
        Self {
            record_type: Arc::clone(record_type),
            values: record_type
                .fields
                .iter()
                .map(|f| f.default.clone())
                .collect(),
        }
    }
}

impl<L> Record<L> {
    /// An instance holding `values`, one per declared field in declaration
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::FieldCount` if the number of values differs
    /// from the number of declared fields.
    pub fn from_values(record_type: &Arc<RecordType<L>>, values: Vec<Value<L>>) -> Result<Self, ContainerError> {
        if values.len() != record_type.fields.len() {
            return Err(ContainerError::FieldCount {
                type_name: record_type.name.to_string(),
                expected: record_type.fields.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            record_type: Arc::clone(record_type),
            values,
        })
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: &str, value: Value<L>) -> Result<Self, ContainerError> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Replace the value of the named field.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::NoSuchField` if the type has no such field.
    pub fn set(&mut self, field: &str, value: Value<L>) -> Result<(), ContainerError> {
        let index = self.index_of(field)?;
        // `values` always has one slot per declared field.
        self.values[index] = value;
        Ok(())
    }

    /// Value of the named field.
    pub fn get(&self, field: &str) -> Option<&Value<L>> {
        self.record_type
            .field_index(field)
            .and_then(|i| self.values.get(i))
    }

    /// The record's type.
    pub fn record_type(&self) -> &Arc<RecordType<L>> {
        &self.record_type
    }

    /// The record's type name.
    pub fn type_name(&self) -> &TypeName {
        &self.record_type.name
    }

    /// Field values in declaration order.
    pub fn values(&self) -> &[Value<L>] {
        &self.values
    }

    /// Iterate over `(field name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldName, &Value<L>)> {
        self.record_type
            .fields
            .iter()
            .map(|f| &f.name)
            .zip(self.values.iter())
    }

    fn index_of(&self, field: &str) -> Result<usize, ContainerError> {
        self.record_type
            .field_index(field)
            .ok_or_else(|| ContainerError::NoSuchField {
                type_name: self.record_type.name.to_string(),
                field: field.to_owned(),
            })
    }
}

impl<L: PartialEq> PartialEq for Record<L> {
    fn eq(&self, other: &Self) -> bool {
        self.record_type.same_layout(&other.record_type) && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Arc<RecordType<i64>> {
        RecordType::builder("Point")
            .field("x", Value::Int(0))
            .field("y", Value::Int(0))
            .field("label", Value::Nil)
            .build()
            .unwrap()
    }

    #[test]
    fn test_key_ordering_across_kinds() {
        let mut keys = vec![
            Key::from("a"),
            Key::Int(3),
            Key::from(false),
            Key::Int(-1),
            Key::from(true),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::Bool(false),
                Key::Bool(true),
                Key::Int(-1),
                Key::Int(3),
                Key::Str("a".into()),
            ]
        );
    }

    #[test]
    fn test_new_record_holds_defaults() {
        let r = Record::new(&point());
        assert_eq!(r.get("x"), Some(&Value::Int(0)));
        assert_eq!(r.get("label"), Some(&Value::Nil));
        assert_eq!(r.type_name(), "Point");
    }

    #[test]
    fn test_set_unknown_field_rejected() {
        let err = Record::new(&point()).with("z", Value::Int(1)).unwrap_err();
        assert_eq!(
            err,
            ContainerError::NoSuchField {
                type_name: "Point".into(),
                field: "z".into(),
            }
        );
    }

    #[test]
    fn test_set_overwrites_declared_field() {
        let mut r = Record::new(&point());
        r.set("label", Value::Str("origin".into())).unwrap();
        r.set("label", Value::Str("center".into())).unwrap();
        assert_eq!(r.get("label"), Some(&Value::Str("center".into())));
        assert_eq!(r.values().len(), 3);
    }

    #[test]
    fn test_from_values_in_declaration_order() {
        let t = point();
        let r = Record::from_values(&t, vec![Value::Int(1), Value::Int(2), Value::Nil]).unwrap();
        assert_eq!(r.get("y"), Some(&Value::Int(2)));
        assert_eq!(r, Record::new(&t).with("x", Value::Int(1)).unwrap().with("y", Value::Int(2)).unwrap());
    }

    #[test]
    fn test_from_values_rejects_wrong_count() {
        let err = Record::from_values(&point(), vec![Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            ContainerError::FieldCount {
                type_name: "Point".into(),
                expected: 3,
                found: 1,
            }
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = RecordType::<i64>::builder("Bad")
            .field("a", Value::Nil)
            .field("a", Value::Nil)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateField { .. }));
    }

    #[test]
    fn test_invalid_type_name_rejected() {
        let err = RecordType::<i64>::builder("not a type").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidName { kind: "type", .. }));
    }

    #[test]
    fn test_fields_iterate_in_declaration_order() {
        let r = Record::new(&point()).with("y", Value::Leaf(7)).unwrap();
        let names: Vec<&str> = r.fields().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["x", "y", "label"]);
        assert_eq!(r.values()[1], Value::Leaf(7));
    }

    #[test]
    fn test_record_equality_includes_every_field() {
        let t = point();
        let a = Record::new(&t).with("label", Value::Str("a".into())).unwrap();
        let b = Record::new(&t).with("label", Value::Str("b".into())).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_shape_descriptions() {
        assert_eq!(Value::<i64>::Leaf(1).shape(), "leaf");
        assert_eq!(
            Value::<i64>::tuple([Value::Nil, Value::Nil]).shape(),
            "tuple of arity 2"
        );
        assert_eq!(Value::Record(Record::new(&point())).shape(), "record `Point`");
    }

    #[test]
    fn test_map_constructor_last_duplicate_wins() {
        let v = Value::<i64>::map([("a", Value::Int(1)), ("a", Value::Int(2))]);
        match v {
            Value::Map(m) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m.get(&Key::from("a")), Some(&Value::Int(2)));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }
}
