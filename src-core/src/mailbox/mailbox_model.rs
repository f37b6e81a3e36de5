use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched mailbox message with decoded headers and body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    /// Provider message id; doubles as the transaction dedup key.
    pub id: String,
    /// Sender (From header).
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Decoded body reduced to plain text.
    pub body_text: String,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Wire types (provider REST responses)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(default)]
    #[allow(dead_code)]
    pub next_page_token: Option<String>,
}

/// Minimal message reference from the list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageResponse {
    pub id: String,
    #[serde(default)]
    pub internal_date: Option<String>,
    pub payload: Option<MessagePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePayload {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    pub body: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// A MIME part of the message; parts nest for multipart/* containers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    pub body: Option<MessageBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    #[serde(default)]
    pub data: Option<String>,
}
