use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::fields::{FieldKinds, ReferenceKind};
use crate::mapping::IdMapping;

/// Nested objects lose this key so stale ids never reach the new store.
const STALE_ID_KEY: &str = "id";

static DEFAULT_FIELDS: LazyLock<FieldKinds> = LazyLock::new(FieldKinds::default);

/// Rewrite references in `value` using the default field table.
pub fn remap_references(value: &Value, mapping: &IdMapping) -> Value {
    Remapper::new(&DEFAULT_FIELDS, mapping).remap(value)
}

/// Rewrites old record ids inside record data to the ids assigned by the
/// current import run.
///
/// The walk builds a fresh value; the input is not touched. A reference with
/// no mapping entry keeps its old value, since the record it points at may
/// simply not have been migrated.
pub struct Remapper<'a> {
    fields: &'a FieldKinds,
    mapping: &'a IdMapping,
}

impl<'a> Remapper<'a> {
    pub fn new(fields: &'a FieldKinds, mapping: &'a IdMapping) -> Self {
        Remapper { fields, mapping }
    }

    pub fn remap(&self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.remap(v)).collect()),
            Value::Object(obj) => Value::Object(self.remap_object(obj)),
            scalar => scalar.clone(),
        }
    }

    fn remap_object(&self, obj: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in obj {
            if key == STALE_ID_KEY {
                continue;
            }

            let kind = self.fields.classify(key);
            let remapped = match (kind, self.fields.collection(kind)) {
                (ReferenceKind::MediaReference | ReferenceKind::PageReference, Some(relation)) => {
                    self.remap_relation_value(value, relation)
                }
                (ReferenceKind::GenericRelation, _) => self
                    .rewrite_reference(value)
                    .unwrap_or_else(|| self.remap(value)),
                _ => self.remap(value),
            };
            out.insert(key.clone(), remapped);
        }
        out
    }

    /// Value of a field known to hold ids into `relation`.
    fn remap_relation_value(&self, value: &Value, relation: &str) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.remap_relation_value(item, relation))
                    .collect(),
            ),
            Value::String(_) | Value::Number(_) => self
                .mapping
                .resolve(relation, value)
                .map(|id| id.to_value())
                .unwrap_or_else(|| value.clone()),
            // A populated document or anything else: walk it like plain data.
            other => self.remap(other),
        }
    }

    /// `{relationTo, value}` with a mapped target: only `value` is replaced,
    /// sibling properties are copied as they are.
    fn rewrite_reference(&self, value: &Value) -> Option<Value> {
        let obj = value.as_object()?;
        let relation = obj
            .get("relationTo")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())?;
        let old = obj.get("value")?;
        let new_id = self.mapping.resolve(relation, old)?;

        let mut rewritten = obj.clone();
        rewritten.insert("value".to_string(), new_id.to_value());
        Some(Value::Object(rewritten))
    }
}
