//! Constructed values carrying their node ids.

use crate::NodeId;
use indexmap::IndexMap;

/// Mapping with insertion-ordered string keys.
pub type Mapping = IndexMap<String, Value>;

/// A constructed document value.
///
/// `id` identifies the parser node the value was built from (see
/// [`crate::PositionStore`]). Values built programmatically have no id.
///
/// Equality is structural: it compares `kind` and ignores `id`, so a
/// resolved document can be compared with the document it came from.
#[derive(Debug, Clone)]
pub struct Value {
    pub id: Option<NodeId>,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self { id: None, kind }
    }

    pub fn with_id(kind: ValueKind, id: NodeId) -> Self {
        Self { id: Some(id), kind }
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Null)
    }

    pub fn empty_mapping() -> Self {
        Self::new(ValueKind::Mapping(Mapping::new()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.kind {
            ValueKind::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Mapping entry by key; None for non-mappings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Child reached by one pointer segment: a key for mappings, a decimal
    /// index for sequences.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match &self.kind {
            ValueKind::Mapping(m) => m.get(segment),
            _ => {
                let index = segment.parse::<usize>().ok()?;
                self.as_sequence()?.get(index)
            }
        }
    }

    /// Build a fresh mapping holding copies of this mapping's entries.
    ///
    /// The overlay keeps this value's id, so it still locates at the
    /// mapping it was copied from, but shares no storage with it. Returns
    /// None for non-mappings.
    pub fn overlay(&self) -> Option<Value> {
        let source = self.as_mapping()?;
        let mut entries = Mapping::with_capacity(source.len());
        for (key, value) in source {
            entries.insert(key.clone(), value.clone());
        }
        Some(Value {
            id: self.id,
            kind: ValueKind::Mapping(entries),
        })
    }

    /// Convert to the JSON data model consumed by schema validators.
    ///
    /// Non-finite reals have no JSON form and become null.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            ValueKind::Null => serde_json::Value::Null,
            ValueKind::Bool(b) => serde_json::Value::Bool(*b),
            ValueKind::Integer(i) => serde_json::Value::from(*i),
            ValueKind::Real(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueKind::String(s) => serde_json::Value::String(s.clone()),
            ValueKind::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            ValueKind::Mapping(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// The text used when this value appears as a mapping key.
    pub fn key_string(&self) -> String {
        match &self.kind {
            ValueKind::Null => "null".to_string(),
            ValueKind::Bool(b) => b.to_string(),
            ValueKind::Integer(i) => i.to_string(),
            ValueKind::Real(f) => f.to_string(),
            ValueKind::String(s) => s.clone(),
            ValueKind::Sequence(_) | ValueKind::Mapping(_) => self.to_json().to_string(),
        }
    }
}

impl From<ValueKind> for Value {
    fn from(kind: ValueKind) -> Self {
        Value::new(kind)
    }
}
