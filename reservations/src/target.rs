use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use serde::{Deserialize, Serialize};

use crate::request::Language;

/// Chat topic assigned to seeded targets until an admin sets the real one.
pub const DEFAULT_TOPIC_ID: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ClubRoom,
    Workshop,
    MusicRoom,
    Storage,
    Equipment,
}

impl Category {
    /// Infer the category from the mailbox prefix of the old listing.
    pub fn from_prefix(prefix: &str) -> Self {
        if prefix.contains("mekaniikka") || prefix.contains("puu") {
            Category::Workshop
        } else if prefix.contains("soitto") {
            Category::MusicRoom
        } else if prefix.contains("varasto") {
            Category::Storage
        } else if prefix.contains("kontti") {
            Category::Equipment
        } else {
            Category::ClubRoom
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::ClubRoom => "Kerhohuone / Club Room",
            Category::Workshop => "Paja / Workshop",
            Category::MusicRoom => "Soittohuone / Music Room",
            Category::Storage => "Varasto / Storage",
            Category::Equipment => "Välineet / Equipment",
        }
    }
}

/// A room or piece of equipment that residents can request access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationTarget {
    /// Unique key, e.g. `jmt10cd`.
    pub email_prefix: String,
    pub label_fi: String,
    pub label_en: String,
    pub category: Category,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_topic_id: Option<String>,
}

fn default_active() -> bool {
    true
}

impl ReservationTarget {
    pub fn label(&self, language: Language) -> &str {
        match language {
            Language::Fi => &self.label_fi,
            Language::En => &self.label_en,
        }
    }
}

/// A problem found in a target listing, with its byte span.
#[derive(Debug, Clone)]
pub struct ListingDiagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ListingDiagnostic {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ListingDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub targets: Vec<ReservationTarget>,
    pub diagnostics: Vec<ListingDiagnostic>,
}

impl Listing {
    pub fn find(&self, email_prefix: &str) -> Option<&ReservationTarget> {
        self.targets.iter().find(|t| t.email_prefix == email_prefix)
    }
}

/// Parse the legacy `prefix;labelFi;labelEn` listing.
///
/// Blank lines are ignored. Incomplete lines and repeated prefixes are skipped
/// with a warning; the first occurrence of a prefix wins. Sort order follows
/// file order starting from 1.
pub fn parse_listing(source: &str, file_id: usize) -> Listing {
    let mut listing = Listing::default();
    let mut sort_order = 1;
    let mut offset = 0;

    for raw_line in source.split('\n') {
        let span = offset..offset + raw_line.len();
        offset += raw_line.len() + 1;

        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split(';').map(str::trim);
        let (Some(prefix), Some(label_fi), Some(label_en)) =
            (fields.next(), fields.next(), fields.next())
        else {
            listing.diagnostics.push(
                ListingDiagnostic::warning("incomplete target line, skipping", span, file_id)
                    .with_note("expected `prefix;Finnish label;English label`"),
            );
            continue;
        };
        if prefix.is_empty() || label_fi.is_empty() || label_en.is_empty() {
            listing.diagnostics.push(ListingDiagnostic::warning(
                "target line has an empty field, skipping",
                span,
                file_id,
            ));
            continue;
        }

        if listing.find(prefix).is_some() {
            listing.diagnostics.push(ListingDiagnostic::warning(
                format!("duplicate prefix '{}', skipping", prefix),
                span,
                file_id,
            ));
            continue;
        }

        listing.targets.push(ReservationTarget {
            email_prefix: prefix.to_string(),
            label_fi: label_fi.to_string(),
            label_en: label_en.to_string(),
            category: Category::from_prefix(prefix),
            active: true,
            sort_order,
            telegram_topic_id: Some(DEFAULT_TOPIC_ID.to_string()),
        });
        sort_order += 1;
    }

    listing
}
