//! Open property bag for properties without a first-class slot on [`Entry`](super::Entry).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A property value the entry model does not know about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extension {
    Text(String),
    List(Vec<Extension>),
    Map(BTreeMap<String, Extension>),
}

impl Extension {
    /// Converts arbitrary JSON into the closed union. Scalars become text,
    /// `null` becomes an empty text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Extension::Text(String::new()),
            Value::Bool(b) => Extension::Text(b.to_string()),
            Value::Number(n) => Extension::Text(n.to_string()),
            Value::String(s) => Extension::Text(s),
            Value::Array(items) => {
                Extension::List(items.into_iter().map(Extension::from_json).collect())
            }
            Value::Object(map) => Extension::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Extension::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Extension::Text(s) => s.is_empty(),
            Extension::List(items) => items.is_empty(),
            Extension::Map(map) => map.is_empty(),
        }
    }

    /// Flattens text leaves, in order.
    pub fn texts(&self) -> Vec<String> {
        match self {
            Extension::Text(s) => vec![s.clone()],
            Extension::List(items) => items.iter().flat_map(Extension::texts).collect(),
            Extension::Map(_) => Vec::new(),
        }
    }

    /// Appends `other` to this value, promoting it to a list when needed.
    pub fn append(&mut self, other: Extension) {
        let incoming = match other {
            Extension::List(items) => items,
            single => vec![single],
        };

        match self {
            Extension::List(items) => items.extend(incoming),
            current => {
                let mut items = vec![std::mem::replace(current, Extension::List(Vec::new()))];
                items.extend(incoming);
                *current = Extension::List(items);
            }
        }
    }
}

impl<'de> Deserialize<'de> for Extension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Extension::from_json)
    }
}
