//! Value tree definitions
//!
//! The closed set of kinds the codec can serialize.

use crate::error::{MomemError, Result};

/// A node in a value tree
///
/// Ownership is strictly tree-shaped: every container owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned 64-bit magnitude
    Integer(u64),

    /// Held at double precision, narrowed to single precision when encoded
    Float(f64),

    /// UTF-8 text
    String(String),

    /// Raw bytes
    Bytes(Vec<u8>),

    /// POSIX seconds, no timezone attached
    Timestamp(f64),

    /// Ordered, heterogeneous sequence
    List(Vec<Value>),

    /// Insertion-ordered mapping
    Dict(Dict),

    /// The 8 ordered record fields:
    /// name, type, size, modified, description, notes, tags, data
    ///
    /// Only valid at the root of an encoded buffer.
    Record(Vec<Value>),
}

impl Value {
    /// Human-readable kind name, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Record(_) => "record",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(u64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i as u64)
    }
}

/// Signed integers are accepted only when non-negative
impl TryFrom<i64> for Value {
    type Error = MomemError;

    fn try_from(i: i64) -> Result<Self> {
        u64::try_from(i)
            .map(Value::Integer)
            .map_err(|_| MomemError::IntegerOutOfRange(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}

// =============================================================================
// Dict
// =============================================================================

/// Insertion-ordered `Value → Value` mapping
///
/// Keys are compared structurally, so any value kind may be a key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, replacing (in place) the value of an existing equal key
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Borrowing counterpart of [`Dict::into_flat`]
    pub(crate) fn flat_iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().flat_map(|(k, v)| [k, v])
    }

    /// Flatten into `[k0, v0, k1, v1, ...]`
    pub fn into_flat(self) -> Vec<Value> {
        self.entries
            .into_iter()
            .flat_map(|(k, v)| [k, v])
            .collect()
    }

    /// Rebuild from an alternating key/value list
    ///
    /// Returns `None` when the list has odd length. Pairs are kept as-is, so
    /// a list with repeated keys round-trips without losing entries.
    pub fn from_flat(items: Vec<Value>) -> Option<Self> {
        if items.len() % 2 != 0 {
            return None;
        }
        let mut entries = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            entries.push((k, v));
        }
        Some(Self { entries })
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl IntoIterator for Dict {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
