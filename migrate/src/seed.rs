//! Seeding a fresh store from the old static site.

use std::path::{Path, PathBuf};

use reservations::Listing;
use richtext::text_to_document;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::config::MigrationConfig;
use crate::error::StoreError;
use crate::store::{CreateRequest, RecordSource, RecordStore};

pub const TARGETS_COLLECTION: &str = "reservation-targets";

/// Target listing, relative to the old site root.
pub const LISTING_PATH: &str = "käyttöpyyntögeneraattori/listat.txt";

const CALENDAR_URL: &str = "https://calendar.google.com/calendar/embed?src=YOUR_CALENDAR_ID";

/// One locale of a seeded page.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleContent {
    pub title: String,
    /// Plain text converted into a content block; empty means no block.
    pub text: String,
    /// Blocks placed after the content block.
    pub blocks: Vec<Value>,
}

impl LocaleContent {
    fn text(title: &str, text: String) -> Self {
        LocaleContent {
            title: title.to_string(),
            text,
            blocks: Vec::new(),
        }
    }

    fn block(title: &str, block: Value) -> Self {
        LocaleContent {
            title: title.to_string(),
            text: String::new(),
            blocks: vec![block],
        }
    }

    /// `layout` field of the page in this locale.
    pub fn layout(&self) -> Result<Value, StoreError> {
        let mut layout = Vec::new();
        if !self.text.is_empty() {
            let rich_text = serde_json::to_value(text_to_document(&self.text))?;
            layout.push(json!({
                "blockType": "content",
                "columns": [{"size": "full", "richText": rich_text}]
            }));
        }
        layout.extend(self.blocks.iter().cloned());
        Ok(Value::Array(layout))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSeed {
    pub slug: String,
    pub fi: LocaleContent,
    pub en: LocaleContent,
}

impl PageSeed {
    fn content(&self, locale: &str) -> &LocaleContent {
        match locale {
            "en" => &self.en,
            _ => &self.fi,
        }
    }
}

/// Missing files read as empty.
fn read_or_empty(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no legacy text, using empty content");
            String::new()
        }
    }
}

/// The pages carried over from the old site.
pub fn legacy_pages(old_site: &Path, content_dir: &Path) -> Vec<PageSeed> {
    let saannot = read_or_empty(&old_site.join("saannot.txt"));
    let rules = read_or_empty(&old_site.join("rules.txt"));
    let for_key_holders = read_or_empty(&old_site.join("avaimellisille.txt"));
    let translated: PathBuf = content_dir.join("avaimellisille_en.txt");
    let for_key_holders_en = if translated.is_file() {
        read_or_empty(&translated)
    } else {
        for_key_holders.clone()
    };
    let tilat = read_or_empty(&old_site.join("tilat.txt"));

    let access_form = |language: &str| {
        json!({
            "blockType": "accessRequestForm",
            "language": language,
            "rulesPageLink": "/saannot",
            "calendarLink": "/kalenteri"
        })
    };
    let calendar = |title: &str, language: &str| {
        json!({
            "blockType": "calendarEmbed",
            "title": title,
            "language": language,
            "height": 600,
            "calendarUrl": CALENDAR_URL
        })
    };

    vec![
        PageSeed {
            slug: "saannot".to_string(),
            fi: LocaleContent::text("Säännöt", saannot),
            en: LocaleContent::text("Rules", rules),
        },
        PageSeed {
            slug: "avaimellisille".to_string(),
            fi: LocaleContent::text("Avaimellisille", for_key_holders),
            en: LocaleContent::text("For Key Holders", for_key_holders_en),
        },
        PageSeed {
            slug: "tilat".to_string(),
            fi: LocaleContent::text("Tilat", tilat.clone()),
            en: LocaleContent::text("Spaces", tilat),
        },
        PageSeed {
            slug: "kayttopyynto".to_string(),
            fi: LocaleContent::block("Käyttöpyyntö", access_form("fi")),
            en: LocaleContent::block("Access Request", access_form("en")),
        },
        PageSeed {
            slug: "kalenteri".to_string(),
            fi: LocaleContent::block("Kalenteri", calendar("OtaHoas Kalenteri", "fi")),
            en: LocaleContent::block("Calendar", calendar("OtaHoas Calendar", "en")),
        },
    ]
}

/// Replace all reservation targets with the listing's.
pub fn seed_targets<S: RecordStore>(store: &mut S, listing: &Listing) -> Result<usize, StoreError> {
    let removed = store.clear(TARGETS_COLLECTION)?;
    debug!(removed, "cleared reservation targets");

    for target in &listing.targets {
        let Value::Object(data) = serde_json::to_value(target)? else {
            return Err(StoreError::NotAnObject);
        };
        store.create(TARGETS_COLLECTION, CreateRequest::new(data))?;
        info!(prefix = %target.email_prefix, "created target");
    }
    info!(count = listing.targets.len(), "seeded reservation targets");
    Ok(listing.targets.len())
}

/// Create the pages that do not exist yet. Returns the slugs created.
pub fn seed_pages<S: RecordStore + RecordSource>(
    store: &mut S,
    pages: &[PageSeed],
    config: &MigrationConfig,
) -> Result<Vec<String>, StoreError> {
    let collection = config.references.page_collection.as_str();
    let primary = config.locales.primary.as_str();
    let existing = store.find(collection, None, config.export.limit)?;
    let mut created = Vec::new();

    for page in pages {
        let exists = existing
            .iter()
            .any(|doc| doc.get("slug").and_then(Value::as_str) == Some(page.slug.as_str()));
        if exists {
            info!(slug = %page.slug, "page already exists, skipping");
            continue;
        }

        let content = page.content(primary);
        let mut data = Map::new();
        data.insert("title".to_string(), Value::from(content.title.as_str()));
        data.insert("slug".to_string(), Value::from(page.slug.as_str()));
        data.insert("layout".to_string(), content.layout()?);
        data.insert("_status".to_string(), Value::from("published"));
        data.insert("hero".to_string(), Value::Object(Map::new()));
        let id = store.create(collection, CreateRequest::new(data).in_locale(primary))?;

        for locale in &config.locales.secondary {
            let content = page.content(locale);
            let mut data = Map::new();
            data.insert("title".to_string(), Value::from(content.title.as_str()));
            data.insert("layout".to_string(), content.layout()?);
            store.update(collection, &id, Some(locale.as_str()), data)?;
        }

        info!(
            slug = %page.slug,
            fi = %page.fi.title,
            en = %page.en.title,
            "created localized page"
        );
        created.push(page.slug.clone());
    }
    Ok(created)
}
