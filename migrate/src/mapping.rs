use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record identifier as assigned by a store: numeric for SQL-backed
/// collections, textual for document stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl Identifier {
    /// Read an identifier out of a JSON scalar. Non-integral numbers and
    /// non-scalars are not identifiers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Identifier::Number),
            Value::String(s) => Some(Identifier::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Identifier::Number(n) => Value::from(*n),
            Identifier::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Number(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

/// `relationTo:oldId`, the key of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub relation_to: String,
    pub old_id: String,
}

impl RelationKey {
    pub fn new(relation_to: impl Into<String>, old_id: impl Into<String>) -> Self {
        RelationKey {
            relation_to: relation_to.into(),
            old_id: old_id.into(),
        }
    }

    /// Build a key from a scalar found in record data. Strings are used
    /// verbatim; an integral float such as `5.0` keys the same as `5`.
    /// Anything else has no key.
    pub fn for_value(relation_to: &str, old: &Value) -> Option<Self> {
        let old_id = match old {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string())?,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(RelationKey::new(relation_to, old_id))
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.relation_to, self.old_id)
    }
}

/// Old identifier to new identifier, accumulated over one import run.
///
/// Entries keep insertion order. Registering the same key twice replaces the
/// value in place.
#[derive(Debug, Default, Clone)]
pub struct IdMapping {
    entries: Vec<(RelationKey, Identifier)>,
    index: HashMap<RelationKey, usize>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, relation_to: &str, old: &Identifier, new: Identifier) {
        self.insert(RelationKey::new(relation_to, old.to_string()), new);
    }

    pub fn insert(&mut self, key: RelationKey, new: Identifier) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = new,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, new));
            }
        }
    }

    pub fn get(&self, key: &RelationKey) -> Option<&Identifier> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Look up the new identifier for a scalar reference value.
    pub fn resolve(&self, relation_to: &str, old: &Value) -> Option<&Identifier> {
        RelationKey::for_value(relation_to, old).and_then(|key| self.get(&key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelationKey, &Identifier)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}
