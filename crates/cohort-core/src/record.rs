//! Synthetic patient records.
//!
//! A `PatientRecord` is an ordered mapping from dimension name to value. The
//! generator produces records holding one field per configured dimension; the
//! narrative stage derives new records with additional fields attached.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One synthetic patient.
///
/// Records are immutable: [`with_field`](Self::with_field) returns a new record.
/// Identity is positional only; there is no patient ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PatientRecord {
    fields: Vec<(String, String)>,
}

impl PatientRecord {
    /// Create a record from ordered `(name, value)` pairs.
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether the record has a field with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// All fields in order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Return a copy of this record with `name` set to `value`.
    ///
    /// An existing field keeps its position; a new field is appended.
    pub fn with_field(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        let mut fields = self.fields.clone();
        match fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name, value)),
        }
        Self { fields }
    }
}

impl Serialize for PatientRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
