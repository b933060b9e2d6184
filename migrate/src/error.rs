use std::path::PathBuf;

use thiserror::Error;

/// Failures of a whole migration run. Per-record failures are reported in the
/// run's report instead and never surface here.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("export file not found: {}", .0.display())]
    MissingExport(PathBuf),
    #[error("malformed export file: {0}")]
    MalformedExport(String),
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("field '{0}' is configured as more than one reference kind")]
    ConflictingField(String),
    #[error("locale '{0}' is both primary and secondary")]
    DuplicateLocale(String),
    #[error("collection '{0}' is listed in more than one collection group")]
    DuplicateCollection(String),
    #[error("media collection '{0}' is not one of the upload collections")]
    MediaNotUploaded(String),
}

/// Errors raised by a record store. Import treats these per record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} has no record with id {id}")]
    UnknownRecord { collection: String, id: String },
    #[error("record data must be a JSON object")]
    NotAnObject,
    #[error("{0}")]
    Rejected(String),
    #[error("store I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data: {0}")]
    Json(#[from] serde_json::Error),
}
