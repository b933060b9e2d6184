use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::mapping::Identifier;

/// Directory next to the store file that receives uploaded files.
pub const UPLOADS_DIR: &str = "uploads";

/// A file attached to a new record.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// `None` for non-localized collections.
    pub locale: Option<String>,
    pub data: Map<String, Value>,
    pub upload: Option<Upload>,
}

impl CreateRequest {
    pub fn new(data: Map<String, Value>) -> Self {
        CreateRequest {
            data,
            ..Default::default()
        }
    }

    pub fn in_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }
}

/// Write side of a content store.
pub trait RecordStore {
    /// Create a record and return the identifier the store assigned to it.
    fn create(&mut self, collection: &str, request: CreateRequest)
    -> Result<Identifier, StoreError>;

    /// Merge `data` into an existing record, in `locale` when given.
    fn update(
        &mut self,
        collection: &str,
        id: &Identifier,
        locale: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Delete every record of a collection. Returns how many were removed.
    fn clear(&mut self, collection: &str) -> Result<usize, StoreError>;
}

/// Read side of a content store. Documents come back with raw ids for
/// references, never populated.
pub trait RecordSource {
    fn find(
        &self,
        collection: &str,
        locale: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    fn find_global(&self, slug: &str, locale: &str) -> Result<Option<Value>, StoreError>;
}

/// Content store kept in a single JSON file. Ids are sequential integers per
/// collection and are never reused, even after `clear`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LocalStore {
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(skip)]
    pending_uploads: Vec<Upload>,
    #[serde(default)]
    collections: BTreeMap<String, StoredCollection>,
    /// slug → locale → document
    #[serde(default)]
    globals: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCollection {
    last_id: i64,
    records: Vec<StoredRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: i64,
    #[serde(default)]
    shared: Map<String, Value>,
    /// Locale the record was created in; used when a requested locale is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_locale: Option<String>,
    #[serde(default)]
    locales: BTreeMap<String, Map<String, Value>>,
}

impl StoredRecord {
    fn document(&self, locale: Option<&str>) -> Value {
        let mut doc = Map::new();
        doc.insert("id".to_string(), Value::from(self.id));
        doc.extend(self.shared.clone());

        let localized = locale
            .and_then(|l| self.locales.get(l))
            .or_else(|| {
                self.default_locale
                    .as_deref()
                    .and_then(|l| self.locales.get(l))
            })
            .or_else(|| self.locales.values().next());
        if let Some(fields) = localized {
            doc.extend(fields.clone());
        }
        Value::Object(doc)
    }
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut store = if path.exists() {
            let source = std::fs::read_to_string(path)?;
            serde_json::from_str(&source)?
        } else {
            LocalStore::default()
        };
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn uploads_dir(&self) -> Option<PathBuf> {
        self.path
            .as_deref()
            .map(|p| p.parent().unwrap_or(Path::new(".")).join(UPLOADS_DIR))
    }

    /// Write the store file and any files uploaded since the last save.
    /// An in-memory store keeps everything in memory.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&*self)?)?;

        if !self.pending_uploads.is_empty() {
            let dir = self.uploads_dir().unwrap_or_else(|| PathBuf::from(UPLOADS_DIR));
            std::fs::create_dir_all(&dir)?;
            for upload in self.pending_uploads.drain(..) {
                std::fs::write(dir.join(&upload.filename), &upload.bytes)?;
            }
        }
        Ok(())
    }

    pub fn set_global(&mut self, slug: &str, locale: &str, data: Map<String, Value>) {
        self.globals
            .entry(slug.to_string())
            .or_default()
            .insert(locale.to_string(), data);
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |c| c.records.len())
    }

    fn record_mut(
        &mut self,
        collection: &str,
        id: &Identifier,
    ) -> Result<&mut StoredRecord, StoreError> {
        let unknown = || StoreError::UnknownRecord {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        let wanted = match id {
            Identifier::Number(n) => *n,
            Identifier::Text(s) => s.parse().map_err(|_| unknown())?,
        };
        self.collections
            .get_mut(collection)
            .and_then(|c| c.records.iter_mut().find(|r| r.id == wanted))
            .ok_or_else(unknown)
    }
}

impl RecordStore for LocalStore {
    fn create(
        &mut self,
        collection: &str,
        request: CreateRequest,
    ) -> Result<Identifier, StoreError> {
        let CreateRequest {
            locale,
            mut data,
            upload,
        } = request;

        if let Some(mut upload) = upload {
            let filename = Path::new(&upload.filename)
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    StoreError::Rejected(format!("invalid upload filename '{}'", upload.filename))
                })?;
            data.insert("filename".to_string(), Value::String(filename.clone()));
            if let Some(mime) = &upload.mime_type {
                data.insert("mimeType".to_string(), Value::String(mime.clone()));
            }
            data.insert("filesize".to_string(), Value::from(upload.bytes.len()));
            upload.filename = filename;
            self.pending_uploads.push(upload);
        }

        let stored = self.collections.entry(collection.to_string()).or_default();
        stored.last_id += 1;
        let id = stored.last_id;

        let mut record = StoredRecord {
            id,
            shared: Map::new(),
            default_locale: None,
            locales: BTreeMap::new(),
        };
        match locale {
            Some(locale) => {
                record.locales.insert(locale.clone(), data);
                record.default_locale = Some(locale);
            }
            None => record.shared = data,
        }
        stored.records.push(record);

        Ok(Identifier::Number(id))
    }

    fn update(
        &mut self,
        collection: &str,
        id: &Identifier,
        locale: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let record = self.record_mut(collection, id)?;
        match locale {
            Some(locale) => record
                .locales
                .entry(locale.to_string())
                .or_default()
                .extend(data),
            None => record.shared.extend(data),
        }
        Ok(())
    }

    fn clear(&mut self, collection: &str) -> Result<usize, StoreError> {
        Ok(self
            .collections
            .get_mut(collection)
            .map_or(0, |c| std::mem::take(&mut c.records).len()))
    }
}

impl RecordSource for LocalStore {
    fn find(
        &self,
        collection: &str,
        locale: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| {
                c.records
                    .iter()
                    .take(limit)
                    .map(|r| r.document(locale))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_global(&self, slug: &str, locale: &str) -> Result<Option<Value>, StoreError> {
        let Some(locales) = self.globals.get(slug) else {
            return Ok(None);
        };
        let Some(fields) = locales.get(locale).or_else(|| locales.values().next()) else {
            return Ok(None);
        };
        let mut doc = Map::new();
        doc.insert("globalType".to_string(), Value::String(slug.to_string()));
        doc.extend(fields.clone());
        Ok(Some(Value::Object(doc)))
    }
}
