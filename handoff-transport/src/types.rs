// ABOUTME: Request and response bodies exchanged with the chat service.
// ABOUTME: SessionId accepts JSON strings or numbers and always serializes as a string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned message ordinal, the total order key for dedup
pub type Ordinal = u64;

/// Reply text the service uses when a chat turn targets a closed session
pub const SESSION_ENDED_SENTINEL: &str = "SESSION_ENDED";

/// Opaque session identifier assigned by the service on handoff
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawSessionId", into = "String")]
pub struct SessionId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSessionId {
    Text(String),
    Number(i64),
}

impl From<RawSessionId> for SessionId {
    fn from(raw: RawSessionId) -> Self {
        match raw {
            RawSessionId::Text(s) => SessionId(s),
            RawSessionId::Number(n) => SessionId(n.to_string()),
        }
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// POST /chat
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurnRequest {
    pub message: String,
    pub visitor_name: String,
    pub session_id: Option<String>,
}

impl ChatTurnRequest {
    pub fn new(
        message: impl Into<String>,
        visitor_name: impl Into<String>,
        session_id: Option<&SessionId>,
    ) -> Self {
        Self {
            message: message.into(),
            visitor_name: visitor_name.into(),
            session_id: session_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub handoff_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(
        default,
        rename = "odoo_session_id",
        alias = "session_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<SessionId>,
}

impl ChatTurnResponse {
    /// A plain AI reply with no handoff
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            handoff_needed: false,
            confidence: None,
            session_id: None,
        }
    }

    /// A reply that hands the visitor off to the given session
    pub fn handoff(response: impl Into<String>, session_id: impl Into<SessionId>) -> Self {
        Self {
            response: response.into(),
            handoff_needed: true,
            confidence: None,
            session_id: Some(session_id.into()),
        }
    }

    /// The service reports that the targeted session no longer exists
    pub fn is_session_ended(&self) -> bool {
        self.response == SESSION_ENDED_SENTINEL
    }
}

// =============================================================================
// POST /upload-file
// =============================================================================

/// A file the visitor wants to share with the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub caption: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

// =============================================================================
// GET /messages/{session_id}
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, alias = "mimetype")]
    pub mime_type: String,
    #[serde(default, alias = "file_size", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: Ordinal,
    #[serde(default, alias = "author_name", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<WireAttachment>,
}

impl WireMessage {
    pub fn new(id: Ordinal, author: &str, body: &str) -> Self {
        Self {
            id,
            author: Some(author.to_string()),
            body: Some(body.to_string()),
            attachments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub session_id: SessionId,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub active: bool,
}
