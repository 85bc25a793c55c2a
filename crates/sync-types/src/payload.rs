//! Typed mirror of a Gmail `users.messages.get?format=full` response.
//!
//! Every field defaults when absent, so adapters can hand these records to the
//! extractor without any further validation.

use serde::{Deserialize, Serialize};

/// A message as returned by the mail service, before extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,
    pub snippet: String,
    pub label_ids: Vec<String>,
    pub payload: MessagePart,
}

/// One node of the MIME part tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub part_id: String,
    pub mime_type: String,
    pub filename: String,
    pub headers: Vec<Header>,
    pub body: PartBody,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Body of a part. `data` is URL-safe base64 text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartBody {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl MessagePart {
    /// Leaf part carrying base64 body data
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        let data = data.into();
        Self {
            mime_type: mime_type.into(),
            body: PartBody {
                size: data.len() as u64,
                data: Some(data),
            },
            ..Default::default()
        }
    }

    /// Container part (e.g. `multipart/alternative`) with children and no data
    pub fn container(mime_type: impl Into<String>, parts: Vec<MessagePart>) -> Self {
        Self {
            mime_type: mime_type.into(),
            parts,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Inline body data, treating an empty string as absent
    pub fn inline_data(&self) -> Option<&str> {
        self.body.data.as_deref().filter(|d| !d.is_empty())
    }

    /// Whether the MIME type is one the body search accepts.
    /// Prefix match, so parameters like `; charset=utf-8` still qualify.
    pub fn is_text_body(&self) -> bool {
        self.mime_type.starts_with("text/plain") || self.mime_type.starts_with("text/html")
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}
