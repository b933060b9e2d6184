use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::MigrationConfig;
use crate::error::{MigrateError, StoreError};
use crate::store::RecordSource;

/// Top-level keys with this prefix hold globals rather than collections.
pub const GLOBAL_PREFIX: &str = "global_";

/// Keys of a global document that belong to the source store only.
const GLOBAL_METADATA_KEYS: &[&str] = &["id", "updatedAt", "createdAt", "globalType"];

/// Records of one collection inside an export file.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionRecords {
    /// `{locale: [record, ...]}`, locales in file order.
    Localized(Vec<(String, Vec<Value>)>),
    /// `[record, ...]`
    Shared(Vec<Value>),
}

impl CollectionRecords {
    /// Records of `locale`. A shared collection has no locales.
    pub fn locale(&self, locale: &str) -> &[Value] {
        match self {
            CollectionRecords::Localized(locales) => locales
                .iter()
                .find(|(l, _)| l == locale)
                .map(|(_, records)| records.as_slice())
                .unwrap_or_default(),
            CollectionRecords::Shared(_) => &[],
        }
    }

    /// Records of a shared collection, or of the first locale otherwise.
    pub fn records(&self) -> &[Value] {
        match self {
            CollectionRecords::Shared(records) => records,
            CollectionRecords::Localized(locales) => {
                locales.first().map(|(_, r)| r.as_slice()).unwrap_or_default()
            }
        }
    }

    pub fn total(&self) -> usize {
        match self {
            CollectionRecords::Shared(records) => records.len(),
            CollectionRecords::Localized(locales) => locales.iter().map(|(_, r)| r.len()).sum(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            CollectionRecords::Shared(records) => Value::Array(records.clone()),
            CollectionRecords::Localized(locales) => Value::Object(
                locales
                    .iter()
                    .map(|(l, r)| (l.clone(), Value::Array(r.clone())))
                    .collect(),
            ),
        }
    }
}

/// The seed export: collections first, then `global_<slug>` documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportFile {
    collections: Vec<(String, CollectionRecords)>,
    globals: Vec<(String, Value)>,
}

impl ExportFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, MigrateError> {
        let Value::Object(top) = value else {
            return Err(MigrateError::MalformedExport(
                "top level must be an object".to_string(),
            ));
        };

        let mut file = ExportFile::new();
        for (key, value) in top {
            if let Some(slug) = key.strip_prefix(GLOBAL_PREFIX) {
                file.insert_global(slug, value);
                continue;
            }
            let records = match value {
                Value::Array(records) => CollectionRecords::Shared(records),
                Value::Object(locales) => {
                    let mut by_locale = Vec::with_capacity(locales.len());
                    for (locale, records) in locales {
                        let Value::Array(records) = records else {
                            return Err(MigrateError::MalformedExport(format!(
                                "{}.{} is not an array of records",
                                key, locale
                            )));
                        };
                        by_locale.push((locale, records));
                    }
                    CollectionRecords::Localized(by_locale)
                }
                _ => {
                    return Err(MigrateError::MalformedExport(format!(
                        "{} is neither a record list nor a locale map",
                        key
                    )));
                }
            };
            file.insert_collection(&key, records);
        }
        Ok(file)
    }

    pub fn to_value(&self) -> Value {
        let mut top = Map::new();
        for (name, records) in &self.collections {
            top.insert(name.clone(), records.to_value());
        }
        for (slug, doc) in &self.globals {
            top.insert(format!("{}{}", GLOBAL_PREFIX, slug), doc.clone());
        }
        Value::Object(top)
    }

    /// Read an export file. A missing file is reported as such so the caller
    /// can stop before touching the store.
    pub fn load(path: &Path) -> Result<Self, MigrateError> {
        if !path.exists() {
            return Err(MigrateError::MissingExport(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path).map_err(|source| MigrateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(serde_json::from_str(&source)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), MigrateError> {
        let write_err = |source| MigrateError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&self.to_value())?;
        std::fs::write(path, json).map_err(write_err)
    }

    pub fn insert_collection(&mut self, name: &str, records: CollectionRecords) {
        match self.collections.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = records,
            None => self.collections.push((name.to_string(), records)),
        }
    }

    pub fn insert_global(&mut self, slug: &str, doc: Value) {
        match self.globals.iter_mut().find(|(s, _)| s == slug) {
            Some((_, existing)) => *existing = doc,
            None => self.globals.push((slug.to_string(), doc)),
        }
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionRecords> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    pub fn global(&self, slug: &str) -> Option<&Value> {
        self.globals.iter().find(|(s, _)| s == slug).map(|(_, d)| d)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|(n, _)| n.as_str())
    }

    pub fn global_slugs(&self) -> impl Iterator<Item = &str> {
        self.globals.iter().map(|(s, _)| s.as_str())
    }
}

/// Read everything the config names out of `source` into an export file.
/// A collection or global that cannot be read is logged and left out.
pub fn export_snapshot<S: RecordSource>(
    source: &S,
    config: &MigrationConfig,
) -> Result<ExportFile, MigrateError> {
    let limit = config.export.limit;
    let mut file = ExportFile::new();

    for collection in &config.collections.localized {
        info!(collection = %collection, "exporting");
        let mut by_locale = Vec::new();
        let read: Result<(), StoreError> = config.all_locales().try_for_each(|locale| {
            let docs = source.find(collection, Some(locale), limit)?;
            by_locale.push((locale.to_string(), docs));
            Ok(())
        });
        if let Err(e) = read {
            warn!(collection = %collection, error = %e, "could not export collection");
            continue;
        }
        let records = CollectionRecords::Localized(by_locale);
        info!(collection = %collection, documents = records.total(), "exported across locales");
        file.insert_collection(collection, records);
    }

    let shared = config
        .collections
        .uploads
        .iter()
        .chain(&config.collections.plain);
    for collection in shared {
        info!(collection = %collection, "exporting");
        match source.find(collection, None, limit) {
            Ok(docs) => {
                info!(collection = %collection, documents = docs.len(), "exported");
                file.insert_collection(collection, CollectionRecords::Shared(docs));
            }
            Err(e) => warn!(collection = %collection, error = %e, "could not export collection"),
        }
    }

    for slug in &config.collections.globals {
        match export_global(source, config, slug) {
            Ok(Some(doc)) => {
                info!(global = %slug, "exported global");
                file.insert_global(slug, doc);
            }
            Ok(None) => warn!(global = %slug, "global has no document, skipping"),
            Err(e) => warn!(global = %slug, error = %e, "could not export global"),
        }
    }

    Ok(file)
}

fn export_global<S: RecordSource>(
    source: &S,
    config: &MigrationConfig,
    slug: &str,
) -> Result<Option<Value>, StoreError> {
    let primary_locale = config.locales.primary.as_str();
    let Some(primary) = source.find_global(slug, primary_locale)? else {
        return Ok(None);
    };
    let mut others = Vec::new();
    for locale in &config.locales.secondary {
        let doc = source
            .find_global(slug, locale)?
            .unwrap_or_else(|| Value::Object(Map::new()));
        others.push((locale.as_str(), doc));
    }
    let others: Vec<(&str, &Value)> = others.iter().map(|(l, d)| (*l, d)).collect();
    Ok(Some(merge_global_locales((primary_locale, &primary), &others)))
}

/// Fold per-locale copies of a global into one document.
///
/// Metadata keys are dropped. `navItems` keep their structure from the primary
/// copy with `link.label` turned into `{locale: label}`; a secondary label that
/// is missing or empty falls back to the primary one. `siteTitle` becomes
/// `{locale: title}`. Everything else is taken from the primary copy.
pub fn merge_global_locales(primary: (&str, &Value), others: &[(&str, &Value)]) -> Value {
    let (primary_locale, primary_doc) = primary;
    let Some(fields) = primary_doc.as_object() else {
        return primary_doc.clone();
    };

    let mut merged = Map::new();
    for (key, value) in fields {
        if GLOBAL_METADATA_KEYS.contains(&key.as_str()) {
            continue;
        }
        match (key.as_str(), value) {
            ("navItems", Value::Array(items)) => {
                let merged_items = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| merge_nav_item(primary_locale, item, index, others))
                    .collect();
                merged.insert(key.clone(), Value::Array(merged_items));
            }
            ("siteTitle", _) => {
                let mut titles = Map::new();
                titles.insert(primary_locale.to_string(), value.clone());
                for (locale, doc) in others {
                    if let Some(title) = doc.get("siteTitle") {
                        titles.insert(locale.to_string(), title.clone());
                    }
                }
                merged.insert(key.clone(), Value::Object(titles));
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

fn merge_nav_item(
    primary_locale: &str,
    item: &Value,
    index: usize,
    others: &[(&str, &Value)],
) -> Value {
    let link = item.get("link");
    let primary_label = link.and_then(|l| l.get("label")).cloned().unwrap_or(Value::Null);

    let mut labels = Map::new();
    labels.insert(primary_locale.to_string(), primary_label.clone());
    for (locale, doc) in others {
        let label = doc
            .get("navItems")
            .and_then(|items| items.get(index))
            .and_then(|other| other.get("link"))
            .and_then(|l| l.get("label"))
            .filter(|label| is_truthy(label))
            .cloned()
            .unwrap_or_else(|| primary_label.clone());
        labels.insert(locale.to_string(), label);
    }

    let mut merged_link = Map::new();
    for key in ["type", "newTab", "reference", "url"] {
        if let Some(value) = link.and_then(|l| l.get(key)) {
            merged_link.insert(key.to_string(), value.clone());
        }
    }
    merged_link.insert("label".to_string(), Value::Object(labels));

    let mut merged_item = Map::new();
    if let Some(id) = item.get("id") {
        merged_item.insert("id".to_string(), id.clone());
    }
    merged_item.insert("link".to_string(), Value::Object(merged_link));
    Value::Object(merged_item)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
