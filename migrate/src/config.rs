use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::fields::{FieldKinds, ReferenceKind};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "otahoas.toml";

/// Settings for seeding, import and export. Every section is optional in the
/// TOML file and falls back to the site's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    pub locales: LocaleConfig,
    pub collections: CollectionConfig,
    pub references: ReferenceConfig,
    pub media: MediaConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleConfig {
    /// Records are created in this locale; other locales are applied as updates.
    pub primary: String,
    pub secondary: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        LocaleConfig {
            primary: "fi".to_string(),
            secondary: vec!["en".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// Exported per locale.
    pub localized: Vec<String>,
    /// Non-localized collections whose records carry an uploaded file.
    pub uploads: Vec<String>,
    /// Non-localized collections without files.
    pub plain: Vec<String>,
    pub globals: Vec<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        CollectionConfig {
            localized: vec!["pages".to_string()],
            uploads: vec!["media".to_string()],
            plain: Vec::new(),
            globals: vec!["header".to_string(), "footer".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    pub media_collection: String,
    pub page_collection: String,
    pub media_fields: Vec<String>,
    pub page_fields: Vec<String>,
    pub relation_fields: Vec<String>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig {
            media_collection: "media".to_string(),
            page_collection: "pages".to_string(),
            media_fields: vec!["image".to_string(), "media".to_string(), "logo".to_string()],
            page_fields: vec!["linkedPage".to_string()],
            relation_fields: vec!["reference".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Directories searched in order for media files, relative to the media root.
    pub sources: Vec<PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        MediaConfig {
            sources: vec![PathBuf::from("public/Tilakuvat"), PathBuf::from("public")],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Maximum records read per collection and locale.
    pub limit: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig { limit: 1000 }
    }
}

impl MigrationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: MigrationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Load `path` if given, else `otahoas.toml` in the working directory if
    /// present, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locales.secondary.contains(&self.locales.primary) {
            return Err(ConfigError::DuplicateLocale(self.locales.primary.clone()));
        }

        let mut seen = HashSet::new();
        let c = &self.collections;
        for name in c.localized.iter().chain(&c.uploads).chain(&c.plain) {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateCollection(name.clone()));
            }
        }

        let media = &self.references.media_collection;
        if !c.uploads.contains(media) {
            return Err(ConfigError::MediaNotUploaded(media.clone()));
        }

        self.field_kinds().map(|_| ())
    }

    /// Primary locale first, then the secondary ones in configured order.
    pub fn all_locales(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.locales.primary.as_str())
            .chain(self.locales.secondary.iter().map(String::as_str))
    }

    pub fn field_kinds(&self) -> Result<FieldKinds, ConfigError> {
        let r = &self.references;
        let mut kinds = FieldKinds::new(&r.media_collection, &r.page_collection);
        for name in &r.media_fields {
            kinds.assign(name, ReferenceKind::MediaReference)?;
        }
        for name in &r.page_fields {
            kinds.assign(name, ReferenceKind::PageReference)?;
        }
        for name in &r.relation_fields {
            kinds.assign(name, ReferenceKind::GenericRelation)?;
        }
        Ok(kinds)
    }
}
