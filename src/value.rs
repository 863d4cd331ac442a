//! Runtime values handled by the dynamic codec, plus the small native types
//! (`Symbol`, `Bytes`, `OrderedMap`) that generated code uses too.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;

// ————————————————————————————————————————————————————————————————————————————
// NATIVE SCALARS
// ————————————————————————————————————————————————————————————————————————————

/// An interned name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(s: &str) -> Self {
        Symbol(Arc::from(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out one shared allocation per distinct name. Lives as long as a
/// single read.
#[derive(Debug, Default)]
pub struct Interner {
    names: HashSet<Arc<str>>,
}

impl Interner {
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(existing) = self.names.get(s) {
            return Symbol(existing.clone());
        }
        let name: Arc<str> = Arc::from(s);
        self.names.insert(name.clone());
        Symbol(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Raw bytes; base64 text on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Bytes(v.to_vec())
    }
}

impl Deref for Bytes {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ORDERED MAP
// ————————————————————————————————————————————————————————————————————————————

/// Insertion-ordered association. Keys only need equality, so any IR type
/// (floats included) can be a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value of an equal key in place (keeping its position),
    /// else appends.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<K, V> OrderedMap<K, V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Builds an `OrderedMap` from a stream of entries in linear time. Each key
/// comes with an identity string (its canonical wire form) that stands in for
/// `PartialEq` when looking for an earlier equal key.
pub struct OrderedMapBuilder<K, V> {
    entries: Vec<(K, V)>,
    positions: HashMap<String, usize>,
}

impl<K, V> OrderedMapBuilder<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Same contract as `OrderedMap::insert`: a repeated key keeps its first
    /// position and takes the last value.
    pub fn insert(&mut self, identity: String, key: K, value: V) -> Option<V> {
        match self.positions.entry(identity) {
            Entry::Occupied(at) => Some(std::mem::replace(&mut self.entries[*at.get()].1, value)),
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn finish(self) -> OrderedMap<K, V> {
        OrderedMap { entries: self.entries }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE
// ————————————————————————————————————————————————————————————————————————————

/// A value classified by the IR. Records and variants keep their fields in
/// the order they were read (declared order) or built.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Str(String),
    Ident(Symbol),
    Binary(Bytes),
    Optional(Option<Box<Value>>),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
    Map(OrderedMap<Value, Value>),
    Record(IndexMap<String, Value>),
    Variant { tag: String, fields: IndexMap<String, Value> },
}

impl Value {
    pub fn some(v: Value) -> Value {
        Value::Optional(Some(Box::new(v)))
    }

    pub fn none() -> Value {
        Value::Optional(None)
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
        Value::Record(fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
    }

    pub fn variant<'a>(tag: &str, fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
        Value::Variant {
            tag: tag.to_owned(),
            fields: fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
        }
    }

    /// Short name of the value's shape, for diagnostics.
    pub fn kind(&self) -> String {
        match self {
            Value::I32(v) => format!("I32 {v}"),
            Value::U32(v) => format!("U32 {v}"),
            Value::I64(v) => format!("I64 {v}"),
            Value::U64(v) => format!("U64 {v}"),
            Value::F64(v) => format!("F64 {v}"),
            Value::Bool(v) => format!("Boolean {v}"),
            Value::Str(_) => "Str".to_owned(),
            Value::Ident(s) => format!("Ident {s}"),
            Value::Binary(b) => format!("Binary ({} bytes)", b.len()),
            Value::Optional(None) => "empty Optional".to_owned(),
            Value::Optional(Some(_)) => "Optional".to_owned(),
            Value::List(xs) => format!("List of {}", xs.len()),
            Value::Object(m) => format!("Object of {}", m.len()),
            Value::Map(m) => format!("Map of {}", m.len()),
            Value::Record(fields) => format!("record {{{}}}", fields.keys().cloned().collect::<Vec<_>>().join(", ")),
            Value::Variant { tag, .. } => format!("variant {tag}"),
        }
    }
}
