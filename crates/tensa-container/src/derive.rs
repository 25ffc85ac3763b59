//! # Container Derivation
//!
//! Turns a record type plus a [`DeriveOptions`] classification into a
//! [`Derivation`]: the dispatch table the registry consults whenever a
//! record of that type is traversed.
//!
//! Fields fall into three disjoint classes:
//!
//! | Class | `traverse` | `reduce` |
//! |-------|-----------|----------|
//! | container | visited in declared order, replaced by the result | visited in declared order |
//! | keep | copied unchanged into the rebuilt record | never visited |
//! | default | reset to the type's default value | never visited |
//!
//! Every name in the options is resolved to a field position when the
//! derivation is built. A name that does not resolve, a name listed twice,
//! or a name listed under both options is rejected there, before the type
//! can be traversed at all. Once built, a derivation is immutable.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tensa_core::{ConfigError, ContainerError, FieldName, Record, RecordType, Value};

/// Field classification supplied when deriving the container capability.
///
/// `containers` is required and fixes the visitation order. `keep` is
/// optional. Any other option is rejected when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeriveOptions {
    /// Fields visited by traversal, in visitation order.
    pub containers: Vec<String>,
    /// Fields preserved unchanged by traversal.
    #[serde(default)]
    pub keep: Vec<String>,
}

impl DeriveOptions {
    /// Options with the given container fields and no kept fields.
    pub fn containers<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            containers: fields.into_iter().map(Into::into).collect(),
            keep: Vec::new(),
        }
    }

    /// Builder-style setter for the kept fields.
    pub fn keep<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(|e| ConfigError::Options(format!("invalid JSON: {e}")))
    }

    /// Parse options from a YAML document.
    pub fn from_yaml(document: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(document).map_err(|e| ConfigError::Options(format!("invalid YAML: {e}")))
    }
}

/// Classification of a single record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    /// Visited by traversal.
    Container,
    /// Preserved unchanged.
    Keep,
    /// Reset to the type's default on traversal.
    Default,
}

/// The installed container capability for one record type.
///
/// Field positions are resolved once, at construction.
#[derive(Debug, Clone)]
pub struct Derivation<L> {
    record_type: Arc<RecordType<L>>,
    containers: Vec<usize>,
    keep: Vec<usize>,
    defaults: Vec<usize>,
}

impl<L> Derivation<L> {
    /// Validate `options` against `record_type` and build the dispatch table.
    ///
    /// # Errors
    ///
    /// - `ConfigError::UnknownField` if a listed name is not a field of the type.
    /// - `ConfigError::DuplicateEntry` if a name is listed twice in one option.
    /// - `ConfigError::OverlappingField` if a name is in both options.
    pub fn new(record_type: &Arc<RecordType<L>>, options: &DeriveOptions) -> Result<Self, ConfigError> {
        let containers = resolve(record_type, "containers", &options.containers)?;
        let keep = resolve(record_type, "keep", &options.keep)?;

        if let Some((field, _)) = options
            .keep
            .iter()
            .zip(&keep)
            .find(|(_, i)| containers.contains(i))
        {
            return Err(ConfigError::OverlappingField {
                type_name: record_type.name().to_string(),
                field: field.clone(),
            });
        }

        let defaults = (0..record_type.fields().len())
            .filter(|i| !containers.contains(i) && !keep.contains(i))
            .collect();

        Ok(Self {
            record_type: Arc::clone(record_type),
            containers,
            keep,
            defaults,
        })
    }

    /// The record type this derivation belongs to.
    pub fn record_type(&self) -> &Arc<RecordType<L>> {
        &self.record_type
    }

    /// Container field names in visitation order.
    pub fn container_fields(&self) -> Vec<&FieldName> {
        self.names(&self.containers)
    }

    /// Kept field names in declared order.
    pub fn kept_fields(&self) -> Vec<&FieldName> {
        self.names(&self.keep)
    }

    /// Default field names in type declaration order.
    pub fn default_fields(&self) -> Vec<&FieldName> {
        self.names(&self.defaults)
    }

    /// Positions of the container fields in visitation order.
    pub fn container_positions(&self) -> &[usize] {
        &self.containers
    }

    /// Positions of the kept fields.
    pub fn kept_positions(&self) -> &[usize] {
        &self.keep
    }

    /// Classify a field by name.
    pub fn classify(&self, field: &str) -> Option<FieldClass> {
        let index = self.record_type.field_index(field)?;
        Some(if self.containers.contains(&index) {
            FieldClass::Container
        } else if self.keep.contains(&index) {
            FieldClass::Keep
        } else {
            FieldClass::Default
        })
    }

    /// Returns true if `record` was built from this derivation's type.
    pub fn accepts(&self, record: &Record<L>) -> bool {
        Arc::ptr_eq(record.record_type(), &self.record_type)
            || record.record_type().same_layout(&self.record_type)
    }

    /// Rebuild `record`: container fields replaced by `f` in declared order,
    /// kept fields copied, every other field reset to the type's default.
    pub fn traverse<'a, A, E, F>(&self, record: &'a Record<L>, acc: A, mut f: F) -> Result<(Record<L>, A), E>
    where
        L: Clone,
        E: From<ContainerError>,
        F: FnMut(&'a Value<L>, A) -> Result<(Value<L>, A), E>,
    {
        self.check(record)?;
        let source = record.values();
        let mut values: Vec<Value<L>> = self
            .record_type
            .fields()
            .iter()
            .map(|field| field.default_value().clone())
            .collect();
        let mut acc = acc;
        // Positions were resolved against this type and `check` guarantees
        // the record shares its layout.
        for &index in &self.containers {
            let (replaced, next) = f(&source[index], acc)?;
            acc = next;
            values[index] = replaced;
        }
        for &index in &self.keep {
            values[index] = source[index].clone();
        }
        let rebuilt = Record::from_values(&self.record_type, values)?;
        Ok((rebuilt, acc))
    }

    /// Fold the container fields of `record` in declared order.
    pub fn reduce<'a, A, E, F>(&self, record: &'a Record<L>, acc: A, mut f: F) -> Result<A, E>
    where
        E: From<ContainerError>,
        F: FnMut(&'a Value<L>, A) -> Result<A, E>,
    {
        self.check(record)?;
        let values = record.values();
        self.containers
            .iter()
            .filter_map(|&index| values.get(index))
            .try_fold(acc, |acc, value| f(value, acc))
    }

    /// Reject a record whose layout differs from the derived type.
    pub(crate) fn check(&self, record: &Record<L>) -> Result<(), ContainerError> {
        if self.accepts(record) {
            Ok(())
        } else {
            Err(ContainerError::UnsupportedShape {
                shape: format!(
                    "record `{}` (its field layout differs from the derived type of that name)",
                    record.type_name()
                ),
            })
        }
    }

    fn names(&self, positions: &[usize]) -> Vec<&FieldName> {
        let fields = self.record_type.fields();
        positions
            .iter()
            .filter_map(|&i| fields.get(i).map(|f| f.name()))
            .collect()
    }
}

fn resolve<L>(
    record_type: &RecordType<L>,
    option: &'static str,
    names: &[String],
) -> Result<Vec<usize>, ConfigError> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut positions = Vec::with_capacity(names.len());
    for name in names {
        let index = record_type
            .field_index(name)
            .ok_or_else(|| ConfigError::UnknownField {
                type_name: record_type.name().to_string(),
                field: name.clone(),
                option,
            })?;
        if !seen.insert(index) {
            return Err(ConfigError::DuplicateEntry {
                type_name: record_type.name().to_string(),
                field: name.clone(),
                option,
            });
        }
        positions.push(index);
    }
    Ok(positions)
}
