use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::error::{ConfigError, StoreError};
use crate::export::{CollectionRecords, ExportFile};
use crate::fields::FieldKinds;
use crate::mapping::{IdMapping, Identifier};
use crate::remap::Remapper;
use crate::store::{CreateRequest, RecordStore, Upload};

/// Keys the source store maintains itself.
const RECORD_METADATA_KEYS: &[&str] = &["id", "updatedAt", "createdAt"];
/// Uploads also drop their generated image sizes; the target store makes its own.
const UPLOAD_METADATA_KEYS: &[&str] = &["id", "updatedAt", "createdAt", "sizes"];

/// Counts for one collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReport {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome of an import run, per collection in import order.
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    collections: Vec<(String, CollectionReport)>,
}

impl ImportReport {
    pub fn collection(&self, name: &str) -> Option<&CollectionReport> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CollectionReport)> {
        self.collections.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn total_failed(&self) -> usize {
        self.collections.iter().map(|(_, r)| r.failed).sum()
    }

    fn entry(&mut self, name: &str) -> &mut CollectionReport {
        let pos = match self.collections.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.collections
                    .push((name.to_string(), CollectionReport::default()));
                self.collections.len() - 1
            }
        };
        &mut self.collections[pos].1
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, r) in &self.collections {
            writeln!(
                f,
                "{}: {} imported, {} updated, {} skipped, {} failed",
                name, r.imported, r.updated, r.skipped, r.failed
            )?;
        }
        Ok(())
    }
}

/// Replays an export file into a fresh store.
///
/// Records are created in dependency order: uploads, then plain collections,
/// then localized collections in the primary locale, then the other locales as
/// updates. Each created record is registered in the mapping table before any
/// later record is remapped, so references to it resolve.
///
/// A record that fails is logged and counted; the run continues.
pub struct Importer<'a, S: RecordStore> {
    store: &'a mut S,
    config: &'a MigrationConfig,
    fields: FieldKinds,
    mapping: IdMapping,
    media_root: PathBuf,
}

impl<'a, S: RecordStore> Importer<'a, S> {
    /// Fails when `config` does not validate, including one assembled in
    /// code rather than loaded from a file.
    pub fn new(store: &'a mut S, config: &'a MigrationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Importer {
            store,
            config,
            fields: config.field_kinds()?,
            mapping: IdMapping::new(),
            media_root: PathBuf::from("."),
        })
    }

    /// Base directory for the configured media sources.
    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = root.into();
        self
    }

    pub fn mapping(&self) -> &IdMapping {
        &self.mapping
    }

    pub fn run(&mut self, export: &ExportFile) -> ImportReport {
        let mut report = ImportReport::default();
        let config = self.config;

        for collection in &config.collections.uploads {
            if let Some(records) = export.collection(collection) {
                self.import_uploads(collection, records.records(), report.entry(collection));
            }
        }

        for collection in &config.collections.plain {
            if let Some(records) = export.collection(collection) {
                self.import_plain(collection, records.records(), report.entry(collection));
            }
        }

        for collection in &config.collections.localized {
            if let Some(records) = export.collection(collection) {
                self.import_localized(collection, records, report.entry(collection));
            }
        }

        for name in export.collection_names() {
            let known = config
                .collections
                .uploads
                .iter()
                .chain(&config.collections.plain)
                .chain(&config.collections.localized)
                .any(|c| c == name);
            if !known {
                warn!(collection = %name, "collection not configured for import, ignoring");
            }
        }

        report
    }

    fn import_uploads(&mut self, collection: &str, docs: &[Value], report: &mut CollectionReport) {
        let sources: Vec<String> = self
            .config
            .media
            .sources
            .iter()
            .map(|s| s.display().to_string())
            .collect();
        info!(collection, sources = %sources.join(", "), "importing uploads");

        for doc in docs {
            match self.import_upload(collection, doc) {
                Ok(Some(filename)) => {
                    report.imported += 1;
                    info!(collection, filename = %filename, "uploaded");
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(collection, error = %e, "failed to import upload");
                }
            }
        }

        info!(
            collection,
            imported = report.imported,
            skipped = report.skipped,
            "uploads done (skipped files were not found in any source)"
        );
    }

    /// `Ok(None)` when the file is not available.
    fn import_upload(
        &mut self,
        collection: &str,
        doc: &Value,
    ) -> Result<Option<String>, StoreError> {
        let fields = strip_keys(doc, UPLOAD_METADATA_KEYS)?;
        let Some(filename) = fields.get("filename").and_then(Value::as_str) else {
            debug!(collection, "record has no filename, skipping");
            return Ok(None);
        };
        let Some(path) = find_source_file(&self.media_root, &self.config.media.sources, filename)
        else {
            debug!(collection, filename, "file not found in any source, skipping");
            return Ok(None);
        };

        let bytes = std::fs::read(&path)?;
        let mut data = Map::new();
        for key in ["alt", "caption"] {
            if let Some(value) = fields.get(key) {
                data.insert(key.to_string(), value.clone());
            }
        }
        let upload = Upload {
            filename: filename.to_string(),
            mime_type: fields
                .get("mimeType")
                .and_then(Value::as_str)
                .map(str::to_string),
            bytes,
        };

        let new_id = self
            .store
            .create(collection, CreateRequest::new(data).with_upload(upload))?;
        self.register(collection, doc, new_id);
        Ok(Some(filename.to_string()))
    }

    fn import_plain(&mut self, collection: &str, docs: &[Value], report: &mut CollectionReport) {
        info!(collection, "importing");
        for doc in docs {
            match self.create_remapped(collection, doc, None) {
                Ok(new_id) => {
                    report.imported += 1;
                    info!(collection, id = %new_id, title = %display_title(doc, &new_id), "created");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(collection, error = %e, "failed to import record");
                }
            }
        }
    }

    fn import_localized(
        &mut self,
        collection: &str,
        records: &CollectionRecords,
        report: &mut CollectionReport,
    ) {
        let config = self.config;
        let primary = config.locales.primary.as_str();
        let primary_docs = match records {
            CollectionRecords::Shared(docs) => docs.as_slice(),
            CollectionRecords::Localized(_) => records.locale(primary),
        };
        info!(collection, locale = primary, "importing");

        // old id -> new id, for attaching the other locales
        let mut created: HashMap<Identifier, Identifier> = HashMap::new();

        for doc in primary_docs {
            match self.create_remapped(collection, doc, Some(primary)) {
                Ok(new_id) => {
                    report.imported += 1;
                    info!(collection, locale = primary, title = %display_title(doc, &new_id), "created");
                    if let Some(old_id) = record_id(doc) {
                        created.insert(old_id, new_id);
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    error!(collection, locale = primary, error = %e, "failed to import record");
                }
            }
        }

        for locale in &config.locales.secondary {
            for doc in records.locale(locale) {
                let target = record_id(doc).and_then(|old| created.get(&old).cloned());
                let Some(new_id) = target else {
                    report.skipped += 1;
                    let old_id = doc.get("id").cloned().unwrap_or_default();
                    warn!(
                        collection,
                        locale = %locale,
                        old_id = %old_id,
                        "no primary-locale record for this id, skipping"
                    );
                    continue;
                };
                match self.update_remapped(collection, &new_id, doc, locale) {
                    Ok(()) => {
                        report.updated += 1;
                        info!(collection, locale = %locale, title = %display_title(doc, &new_id), "updated");
                    }
                    Err(e) => {
                        report.failed += 1;
                        error!(collection, locale = %locale, error = %e, "failed to update record");
                    }
                }
            }
        }
    }

    fn create_remapped(
        &mut self,
        collection: &str,
        doc: &Value,
        locale: Option<&str>,
    ) -> Result<Identifier, StoreError> {
        let data = self.remapped_fields(doc)?;
        let mut request = CreateRequest::new(data);
        if let Some(locale) = locale {
            request = request.in_locale(locale);
        }
        let new_id = self.store.create(collection, request)?;
        self.register(collection, doc, new_id.clone());
        Ok(new_id)
    }

    fn update_remapped(
        &mut self,
        collection: &str,
        id: &Identifier,
        doc: &Value,
        locale: &str,
    ) -> Result<(), StoreError> {
        let data = self.remapped_fields(doc)?;
        self.store.update(collection, id, Some(locale), data)
    }

    fn remapped_fields(&self, doc: &Value) -> Result<Map<String, Value>, StoreError> {
        let fields = strip_keys(doc, RECORD_METADATA_KEYS)?;
        match Remapper::new(&self.fields, &self.mapping).remap(&Value::Object(fields)) {
            Value::Object(remapped) => Ok(remapped),
            _ => Err(StoreError::NotAnObject),
        }
    }

    fn register(&mut self, collection: &str, doc: &Value, new_id: Identifier) {
        match record_id(doc) {
            Some(old_id) => self.mapping.register(collection, &old_id, new_id),
            None => debug!(collection, "record has no id; references to it cannot be remapped"),
        }
    }
}

fn record_id(doc: &Value) -> Option<Identifier> {
    doc.get("id").and_then(Identifier::from_value)
}

fn strip_keys(doc: &Value, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
    let obj = doc.as_object().ok_or(StoreError::NotAnObject)?;
    Ok(obj
        .iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect())
}

/// `title`, else `slug`, else the new id.
fn display_title(doc: &Value, new_id: &Identifier) -> String {
    ["title", "slug"]
        .iter()
        .filter_map(|k| doc.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| new_id.to_string())
}

/// First source directory (in order) that contains `filename`.
pub fn find_source_file(root: &Path, sources: &[PathBuf], filename: &str) -> Option<PathBuf> {
    sources
        .iter()
        .map(|source| root.join(source).join(filename))
        .find(|candidate| candidate.is_file())
}
