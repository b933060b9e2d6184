pub mod config;
pub mod error;
pub mod export;
pub mod fields;
pub mod import;
pub mod mapping;
pub mod remap;
pub mod seed;
pub mod store;

pub use config::MigrationConfig;
pub use error::{ConfigError, MigrateError, StoreError};
pub use export::{ExportFile, export_snapshot};
pub use import::{ImportReport, Importer};
pub use mapping::{IdMapping, Identifier};
pub use remap::remap_references;
pub use store::{LocalStore, RecordSource, RecordStore};
