//! Payload shapes delivered by the mail service, already deserialized.
//!
//! Every field the service may omit is optional so a sparse response never
//! fails to decode.

use serde::{Deserialize, Serialize};

pub const LABEL_TYPE_USER: &str = "user";
pub const LABEL_LIST_SHOW: &str = "labelShow";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelColor {
    pub text_color: String,
    pub background_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub label_type: Option<String>,
    pub label_list_visibility: Option<String>,
    pub message_list_visibility: Option<String>,
    pub messages_total: Option<u32>,
    pub messages_unread: Option<u32>,
    pub threads_total: Option<u32>,
    pub threads_unread: Option<u32>,
    pub color: Option<LabelColor>,
}

impl Label {
    /// User-created labels the account wants listed in navigation.
    pub fn is_visible_user_label(&self) -> bool {
        self.label_type.as_deref() == Some(LABEL_TYPE_USER)
            && self.label_list_visibility.as_deref() == Some(LABEL_LIST_SHOW)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub id: Option<String>,
    pub snippet: Option<String>,
    pub history_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Option<String>,
    pub snippet: Option<String>,
    pub history_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

impl Thread {
    pub fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            id: self.id.clone(),
            snippet: self.snippet.clone(),
            history_id: self.history_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: Option<String>,
    pub thread_id: Option<String>,
    pub label_ids: Option<Vec<String>>,
    pub snippet: Option<String>,
    pub history_id: Option<String>,
    pub internal_date: Option<String>,
    pub size_estimate: Option<u64>,
    pub payload: Option<MessagePart>,
}

/// One node of the body tree. A part may carry a payload, children, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub part_id: Option<String>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub headers: Vec<MessagePartHeader>,
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    pub fn has_mime_type(&self, mime_type: &str) -> bool {
        self.mime_type.as_deref() == Some(mime_type)
    }

    pub fn child_with_mime_type(&self, mime_type: &str) -> Option<&MessagePart> {
        self.parts.iter().find(|part| part.has_mime_type(mime_type))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
    pub attachment_id: Option<String>,
    pub size: Option<u64>,
    /// URL-safe base64.
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessagePartHeader {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Account profile shown in the app bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}
