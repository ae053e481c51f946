use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Header names are lower-cased; re-inserting a name keeps its first
/// position and takes the newer value.
pub type HeaderMap = IndexMap<String, String>;

pub const UNREAD_LABEL: &str = "UNREAD";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub inline: bool,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub attachment_id: Option<String>,
    pub headers: HeaderMap,
}

/// Flat, render-ready view of a single message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ParsedMessage {
    pub id: Option<String>,
    pub thread_id: Option<String>,
    pub label_ids: BTreeSet<String>,
    pub from: Option<Address>,
    pub snippet: Option<String>,
    pub history_id: Option<String>,
    pub internal_date: Option<String>,
    pub headers: HeaderMap,
    pub text_html: Option<String>,
    pub text_plain: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl ParsedMessage {
    /// The authoritative body: HTML when present, plain text otherwise.
    pub fn body(&self) -> Option<&str> {
        self.text_html
            .as_deref()
            .filter(|html| !html.is_empty())
            .or(self.text_plain.as_deref())
    }

    pub fn has_label(&self, label_id: &str) -> bool {
        self.label_ids.contains(label_id)
    }

    pub fn is_unread(&self) -> bool {
        self.has_label(UNREAD_LABEL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ThreadMetadata {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub subject: Option<String>,
    pub label_ids: BTreeSet<String>,
}
