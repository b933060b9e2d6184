use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    #[serde(rename = "HTML")]
    Html,
    Markdown,
    MarkdownV2,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    /// Forum topic of the group chat.
    pub topic_id: Option<String>,
    pub parse_mode: ParseMode,
    pub silent: bool,
    pub disable_link_preview: bool,
    pub protect_content: bool,
    pub reply_to: Option<i64>,
}

impl OutgoingMessage {
    pub fn html(text: impl Into<String>) -> Self {
        OutgoingMessage {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    /// JSON body of a `sendMessage` call. Flags appear only when set.
    pub fn request_body(&self, chat_id: &str) -> Value {
        let mut body = Map::new();
        body.insert("chat_id".to_string(), Value::from(chat_id));
        body.insert("text".to_string(), Value::from(self.text.as_str()));
        body.insert("parse_mode".to_string(), Value::from(self.parse_mode.as_str()));

        if let Some(thread) = self.topic_id.as_deref().and_then(leading_integer) {
            body.insert("message_thread_id".to_string(), Value::from(thread));
        }
        if self.silent {
            body.insert("disable_notification".to_string(), Value::Bool(true));
        }
        if self.disable_link_preview {
            body.insert("disable_web_page_preview".to_string(), Value::Bool(true));
        }
        if self.protect_content {
            body.insert("protect_content".to_string(), Value::Bool(true));
        }
        if let Some(reply_to) = self.reply_to.filter(|id| *id != 0) {
            body.insert("reply_to_message_id".to_string(), Value::from(reply_to));
        }
        Value::Object(body)
    }
}

static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("valid integer regex"));

/// Integer at the start of `s`, after optional whitespace and sign.
/// `"12abc"` gives 12; `"abc"` gives nothing.
fn leading_integer(s: &str) -> Option<i64> {
    let captures = LEADING_INTEGER.captures(s)?;
    captures[1].parse().ok()
}

/// Credentials for the group chat that receives requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl ChatConfig {
    /// `None` unless both variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(
            std::env::var(BOT_TOKEN_VAR).ok(),
            std::env::var(CHAT_ID_VAR).ok(),
        )
    }

    pub fn from_vars(bot_token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        let bot_token = bot_token.filter(|t| !t.is_empty())?;
        let chat_id = chat_id.filter(|c| !c.is_empty())?;
        Some(ChatConfig { bot_token, chat_id })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageReceipt {
    pub message_id: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("chat not configured: missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID")]
    NotConfigured,
    #[error("chat API error: {0}")]
    Api(String),
}

/// Reply of the chat API to `sendMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<ApiMessage>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub message_id: i64,
}

impl ApiResponse {
    pub fn into_receipt(self) -> Result<MessageReceipt, NotifyError> {
        if !self.ok {
            return Err(NotifyError::Api(
                self.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(MessageReceipt {
            message_id: self.result.map(|m| m.message_id),
        })
    }
}

/// Delivers messages to the group chat.
pub trait Notifier {
    fn is_configured(&self) -> bool {
        true
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<MessageReceipt, NotifyError>;
}

/// Records request bodies instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct DryRunNotifier {
    chat: Option<ChatConfig>,
    sent: Vec<Value>,
}

impl DryRunNotifier {
    pub fn new(chat: Option<ChatConfig>) -> Self {
        DryRunNotifier {
            chat,
            sent: Vec::new(),
        }
    }

    pub fn sent(&self) -> &[Value] {
        &self.sent
    }
}

impl Notifier for DryRunNotifier {
    fn is_configured(&self) -> bool {
        self.chat.is_some()
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<MessageReceipt, NotifyError> {
        let chat = self.chat.as_ref().ok_or(NotifyError::NotConfigured)?;
        let body = message.request_body(&chat.chat_id);
        debug!(chat_id = %chat.chat_id, "dry run, not sending");
        self.sent.push(body);
        Ok(MessageReceipt {
            message_id: Some(self.sent.len() as i64),
        })
    }
}
