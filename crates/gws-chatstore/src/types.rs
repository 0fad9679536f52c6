//! Chat document model.
//!
//! These shapes are the on-disk JSON format of stored chats, so field
//! names and tag values are part of the persistence contract. Response
//! parts are ingested defensively: missing fields default instead of
//! failing the whole document, and blocks with an unrecognized tag are
//! carried through verbatim so a round-trip never drops them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Sentinel id of an unsaved, local-only chat session.
pub const LOCAL_CHAT_ID: &str = "";

/// File extension chats are stored under.
pub const CHAT_FILE_EXT: &str = ".json";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Listing-level chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A chat as it appears in the sidebar listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    /// Display name (storage extension already stripped).
    pub name: String,
    pub created_time: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn is_local(&self) -> bool {
        self.id == LOCAL_CHAT_ID
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Conversation content
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Full content of one chat document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
}

impl ChatContent {
    /// Fresh local-only session.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            id: LOCAL_CHAT_ID.to_string(),
            name: name.into(),
            conversation: Vec::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.id == LOCAL_CHAT_ID
    }
}

/// A file attached to a user turn; `content` is base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub content: String,
}

/// One turn of the conversation, tagged by speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConversationTurn {
    User {
        prompt: String,
        #[serde(default)]
        attachments: Vec<Attachment>,
        timestamp: String,
    },
    Ai {
        #[serde(default)]
        parts: Vec<ResponsePart>,
        timestamp: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Structured response parts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One structured block of an AI response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Title { content: String, subtitle: Option<String> },
    Heading { content: String },
    Subheading { content: String },
    AnnotatedHeading { content: String, tag: String },
    QuoteHeading { content: String, source: Option<String> },
    Text { content: String },
    Code { language: String, content: String },
    Math { content: String },
    List { items: Vec<String> },
    /// Block with an unrecognized tag, preserved verbatim.
    Unknown(Value),
}

fn str_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

impl ResponsePart {
    /// Ingest one block. Missing fields default; an unrecognized or
    /// malformed block becomes `Unknown` instead of failing.
    pub fn from_value(value: Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::Unknown(value);
        };
        let Some(tag) = map.get("type").and_then(Value::as_str) else {
            return Self::Unknown(value);
        };
        match tag {
            "title" => Self::Title {
                content: str_field(map, "content"),
                subtitle: opt_str_field(map, "subtitle"),
            },
            "heading" => Self::Heading {
                content: str_field(map, "content"),
            },
            "subheading" => Self::Subheading {
                content: str_field(map, "content"),
            },
            "annotated_heading" => Self::AnnotatedHeading {
                content: str_field(map, "content"),
                tag: str_field(map, "tag"),
            },
            "quote_heading" => Self::QuoteHeading {
                content: str_field(map, "content"),
                source: opt_str_field(map, "source"),
            },
            "text" => Self::Text {
                content: str_field(map, "content"),
            },
            "code" => Self::Code {
                language: str_field(map, "language"),
                content: str_field(map, "content"),
            },
            "math" => Self::Math {
                content: str_field(map, "content"),
            },
            "list" => Self::List {
                items: map
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            _ => Self::Unknown(value),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Title { content, subtitle } => {
                let mut v = json!({"type": "title", "content": content});
                if let (Some(sub), Some(map)) = (subtitle, v.as_object_mut()) {
                    map.insert("subtitle".into(), Value::String(sub.clone()));
                }
                v
            }
            Self::Heading { content } => json!({"type": "heading", "content": content}),
            Self::Subheading { content } => json!({"type": "subheading", "content": content}),
            Self::AnnotatedHeading { content, tag } => {
                json!({"type": "annotated_heading", "content": content, "tag": tag})
            }
            Self::QuoteHeading { content, source } => {
                let mut v = json!({"type": "quote_heading", "content": content});
                if let (Some(src), Some(map)) = (source, v.as_object_mut()) {
                    map.insert("source".into(), Value::String(src.clone()));
                }
                v
            }
            Self::Text { content } => json!({"type": "text", "content": content}),
            Self::Code { language, content } => {
                json!({"type": "code", "language": language, "content": content})
            }
            Self::Math { content } => json!({"type": "math", "content": content}),
            Self::List { items } => json!({"type": "list", "items": items}),
            Self::Unknown(value) => value.clone(),
        }
    }
}

impl Serialize for ResponsePart {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResponsePart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
