use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::notify::{Notifier, OutgoingMessage};
use crate::target::{Listing, ReservationTarget};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fi,
    En,
}

/// Why a request was refused before anything was sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid target")]
    UnknownTarget,
    #[error("This target is not currently accepting requests")]
    InactiveTarget,
    #[error("Notification system not configured")]
    NotConfigured,
    #[error("This target has no configured notification channel")]
    NoChannel,
}

/// A resident's request to use a room or equipment.
///
/// Required fields deserialize to empty strings when absent so that
/// `validate` can report all of them at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub target_id: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl AccessRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let required = [
            ("targetId", &self.target_id),
            ("name", &self.name),
            ("email", &self.email),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
            ("startTime", &self.start_time),
            ("endTime", &self.end_time),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(RequestError::MissingFields(missing));
        }
        if !is_valid_email(&self.email) {
            return Err(RequestError::InvalidEmail);
        }
        Ok(())
    }

    /// The target this request names, looked up by mailbox prefix.
    pub fn target_in<'a>(&self, listing: &'a Listing) -> Result<&'a ReservationTarget, RequestError> {
        listing
            .find(&self.target_id)
            .ok_or(RequestError::UnknownTarget)
    }
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// `2024-05-17` → `17.05.2024`. Anything without three dash-separated parts
/// is returned unchanged.
pub fn format_date_finnish(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [year, month, day, ..] => format!("{}.{}.{}", day, month, year),
        _ => date.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The chat message announcing a request. Always in English; the handlers
/// reading the chat are not necessarily Finnish speakers.
pub fn notification_text(request: &AccessRequest, target: &ReservationTarget) -> String {
    let mut lines = vec![
        format!("<b>Access Request: {}</b>", escape_html(&target.label_en)),
        String::new(),
        format!("<b>Name:</b> {}", escape_html(&request.name)),
        format!("<b>Email:</b> {}", escape_html(&request.email)),
    ];

    let optional = [
        ("Phone", &request.phone),
        ("Telegram", &request.telegram),
        ("Address", &request.address),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("<b>{}:</b> {}", label, escape_html(value)));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "<b>Start Date:</b> {}",
        escape_html(&format_date_finnish(&request.start_date))
    ));
    lines.push(format!(
        "<b>End Date:</b> {}",
        escape_html(&format_date_finnish(&request.end_date))
    ));
    lines.push(format!("<b>Start Time:</b> {}", escape_html(&request.start_time)));
    lines.push(format!("<b>End Time:</b> {}", escape_html(&request.end_time)));

    if let Some(n) = request.participants.filter(|n| *n > 0) {
        lines.push(format!("<b>Participants:</b> {}", n));
    }
    if let Some(purpose) = request.use_type.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("<b>Purpose:</b> {}", escape_html(purpose)));
    }
    if let Some(details) = request.details.as_deref().filter(|v| !v.is_empty()) {
        lines.push(String::new());
        lines.push("<b>Additional Details:</b>".to_string());
        lines.push(escape_html(details));
    }

    lines.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Record of one submitted request and what happened to its notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Mailbox prefix of the target.
    pub target: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub request_data: AccessRequest,
    pub notification_sent_to: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Submission {
    pub fn succeeded(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }

    /// Message shown to the submitter, in the language they used.
    pub fn response_message(&self) -> &'static str {
        match (self.succeeded(), self.request_data.language) {
            (true, Language::Fi) => "Käyttöpyyntö lähetetty onnistuneesti",
            (true, Language::En) => "Access request sent successfully",
            (false, Language::Fi) => "Viestin lähetys epäonnistui. Yritä myöhemmin uudelleen.",
            (false, Language::En) => "Failed to send message. Please try again later.",
        }
    }
}

/// Validate a request and notify the target's chat topic.
///
/// Refusals (invalid input, inactive target, nowhere to send) return an
/// error and send nothing. Once a submission is recorded it is always
/// returned; a failed delivery shows up in its status.
pub fn submit<N: Notifier>(
    request: &AccessRequest,
    target: &ReservationTarget,
    notifier: &mut N,
) -> Result<Submission, RequestError> {
    request.validate()?;
    if !target.active {
        return Err(RequestError::InactiveTarget);
    }
    if !notifier.is_configured() {
        error!("notification chat not configured");
        return Err(RequestError::NotConfigured);
    }
    let Some(topic) = target.telegram_topic_id.as_deref().filter(|t| !t.is_empty()) else {
        error!(prefix = %target.email_prefix, "no chat topic configured for target");
        return Err(RequestError::NoChannel);
    };

    let message = OutgoingMessage::html(notification_text(request, target)).in_topic(topic);
    let mut submission = Submission {
        target: target.email_prefix.clone(),
        submitter_name: request.name.clone(),
        submitter_email: request.email.clone(),
        request_data: request.clone(),
        notification_sent_to: format!("Telegram topic {}", topic),
        status: DeliveryStatus::Pending,
        error_message: None,
    };

    match notifier.send(&message) {
        Ok(receipt) => {
            submission.status = DeliveryStatus::Sent;
            info!(prefix = %target.email_prefix, message_id = ?receipt.message_id, "access request sent");
        }
        Err(e) => {
            submission.status = DeliveryStatus::Failed;
            submission.error_message = Some(e.to_string());
            error!(prefix = %target.email_prefix, error = %e, "failed to send access request");
        }
    }
    Ok(submission)
}
