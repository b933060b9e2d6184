use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the remapper treats the value stored under a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Bare id (or array of ids) into the media collection.
    #[serde(rename = "media")]
    MediaReference,
    /// Bare id (or array of ids) into the pages collection.
    #[serde(rename = "page")]
    PageReference,
    /// `{relationTo, value}` object naming its own collection.
    #[serde(rename = "relation")]
    GenericRelation,
    #[serde(rename = "plain")]
    PlainData,
}

/// Field name to reference kind, resolved once per run.
#[derive(Debug, Clone)]
pub struct FieldKinds {
    fields: HashMap<String, ReferenceKind>,
    media_collection: String,
    page_collection: String,
}

impl FieldKinds {
    /// An empty table: every field is plain data.
    pub fn new(media_collection: impl Into<String>, page_collection: impl Into<String>) -> Self {
        FieldKinds {
            fields: HashMap::new(),
            media_collection: media_collection.into(),
            page_collection: page_collection.into(),
        }
    }

    /// Assign `name` to `kind`. Assigning a second, different kind is an error.
    pub fn assign(&mut self, name: &str, kind: ReferenceKind) -> Result<(), ConfigError> {
        match self.fields.get(name) {
            Some(existing) if *existing != kind => {
                Err(ConfigError::ConflictingField(name.to_string()))
            }
            _ => {
                self.fields.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    pub fn with(mut self, name: &str, kind: ReferenceKind) -> Result<Self, ConfigError> {
        self.assign(name, kind)?;
        Ok(self)
    }

    pub fn classify(&self, name: &str) -> ReferenceKind {
        self.fields
            .get(name)
            .copied()
            .unwrap_or(ReferenceKind::PlainData)
    }

    /// Collection that bare ids of this kind point into.
    pub fn collection(&self, kind: ReferenceKind) -> Option<&str> {
        match kind {
            ReferenceKind::MediaReference => Some(&self.media_collection),
            ReferenceKind::PageReference => Some(&self.page_collection),
            ReferenceKind::GenericRelation | ReferenceKind::PlainData => None,
        }
    }
}

impl Default for FieldKinds {
    fn default() -> Self {
        let mut kinds = FieldKinds::new("media", "pages");
        for name in ["image", "media", "logo"] {
            kinds
                .fields
                .insert(name.to_string(), ReferenceKind::MediaReference);
        }
        kinds
            .fields
            .insert("linkedPage".to_string(), ReferenceKind::PageReference);
        kinds
            .fields
            .insert("reference".to_string(), ReferenceKind::GenericRelation);
        kinds
    }
}
