//! The n-tuple record and its JSON wire form.
//!
//! Decoding from JSON is total: every object becomes a [`Ntuple::Node`] and
//! every other value (string, number, bool, null, list) becomes an opaque
//! [`Ntuple::Leaf`]. Lists are not descended into.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::NtupleError;

/// Marker character a wire key carries when its field is a pending slot.
pub const PENDING_MARKER: char = '*';

/// Ordered field mapping of an n-tuple node.
pub type Fields = IndexMap<String, Entry>;

/// A structured semantic record.
#[derive(Debug, Clone, PartialEq)]
pub enum Ntuple {
    /// An opaque value. Lists stay leaves even when they hold mappings.
    Leaf(Value),
    /// A named mapping of field → entry, in wire order.
    Node(Fields),
}

/// One field of an n-tuple node.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A resolved field.
    Bound(Ntuple),
    /// A field waiting for a clarification descriptor. The value is
    /// whatever placeholder the solver left there (usually `"?"`).
    Pending(Ntuple),
}

impl Entry {
    pub fn value(&self) -> &Ntuple {
        match self {
            Entry::Bound(value) | Entry::Pending(value) => value,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Entry::Pending(_))
    }
}

impl Ntuple {
    /// Parse an n-tuple from JSON text.
    pub fn from_json(text: &str) -> Result<Self, NtupleError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Ntuple::from(value))
    }

    /// Look up a field of a node. Leaves have no fields.
    pub fn get(&self, field: &str) -> Option<&Ntuple> {
        match self {
            Ntuple::Node(fields) => fields.get(field).map(Entry::value),
            Ntuple::Leaf(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Ntuple::Node(_))
    }

    /// The node's fields, or [`NtupleError::NotAMapping`] for a leaf.
    pub fn fields(&self) -> Result<&Fields, NtupleError> {
        match self {
            Ntuple::Node(fields) => Ok(fields),
            Ntuple::Leaf(_) => Err(NtupleError::NotAMapping),
        }
    }

    /// Whether any field, at any depth of nested mappings, is pending.
    pub fn has_pending(&self) -> bool {
        match self {
            Ntuple::Leaf(_) => false,
            Ntuple::Node(fields) => fields
                .values()
                .any(|entry| entry.is_pending() || entry.value().has_pending()),
        }
    }

    /// Dotted paths of every pending field, depth first.
    pub fn pending_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_pending("", &mut paths);
        paths
    }

    fn collect_pending(&self, prefix: &str, paths: &mut Vec<String>) {
        if let Ntuple::Node(fields) = self {
            for (name, entry) in fields {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                if entry.is_pending() {
                    paths.push(path.clone());
                }
                entry.value().collect_pending(&path, paths);
            }
        }
    }
}

impl From<Value> for Ntuple {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let fields = map
                    .into_iter()
                    .map(|(key, value)| {
                        let value = Ntuple::from(value);
                        if key.contains(PENDING_MARKER) {
                            (key.replace(PENDING_MARKER, ""), Entry::Pending(value))
                        } else {
                            (key, Entry::Bound(value))
                        }
                    })
                    .collect();
                Ntuple::Node(fields)
            }
            other => Ntuple::Leaf(other),
        }
    }
}

impl From<Ntuple> for Value {
    fn from(ntuple: Ntuple) -> Self {
        match ntuple {
            Ntuple::Leaf(value) => value,
            Ntuple::Node(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(name, entry)| match entry {
                        Entry::Bound(value) => (name, Value::from(value)),
                        Entry::Pending(value) => {
                            (format!("{name}{PENDING_MARKER}"), Value::from(value))
                        }
                    })
                    .collect(),
            ),
        }
    }
}

impl Serialize for Ntuple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ntuple::Leaf(value) => value.serialize(serializer),
            Ntuple::Node(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, entry) in fields {
                    match entry {
                        Entry::Bound(value) => map.serialize_entry(name, value)?,
                        Entry::Pending(value) => {
                            map.serialize_entry(&format!("{name}{PENDING_MARKER}"), value)?
                        }
                    }
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Ntuple {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Ntuple::from)
    }
}

impl fmt::Display for Ntuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(text) => write!(f, "{text}"),
            Err(_) => Err(fmt::Error),
        }
    }
}
