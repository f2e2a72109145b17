// ABOUTME: Immutable chat messages and attachments as rendered by the presentation sink.
// ABOUTME: Attachment media class is a pure function of the MIME type.

use chrono::{DateTime, Utc};
use handoff_transport::{Ordinal, WireAttachment, WireMessage};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const AI_AUTHOR: &str = "AI Assistant";
pub const SYSTEM_AUTHOR: &str = "System";
pub const AGENT_AUTHOR: &str = "Agent";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Ai,
    Agent,
    Visitor,
    System,
}

/// Coarse media class used for rendering and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    Image,
    Audio,
    File,
}

impl MediaClass {
    pub fn classify(mime_type: &str) -> Self {
        let mime = mime_type.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            MediaClass::Image
        } else if mime.starts_with("audio/") || mime.contains("voice") {
            MediaClass::Audio
        } else {
            MediaClass::File
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// URL or service-relative path the file can be fetched from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            download: None,
        }
    }

    /// Service attachments without a URL are served from `/download/{id}`
    pub fn from_wire(wire: &WireAttachment) -> Self {
        Self {
            name: wire.name.clone(),
            mime_type: wire.mime_type.clone(),
            size: wire.size.unwrap_or(0),
            download: wire
                .url
                .clone()
                .or_else(|| wire.id.map(|id| format!("/download/{}", id))),
        }
    }

    pub fn media_class(&self) -> MediaClass {
        MediaClass::classify(&self.mime_type)
    }
}

/// One-line description of an attachment-only message
pub fn attachment_summary(attachments: &[Attachment]) -> Option<String> {
    let first = attachments.first()?;
    let count = attachments.len();
    Some(match first.media_class() {
        MediaClass::Audio => "Voice message".to_string(),
        MediaClass::Image if count == 1 => "Image".to_string(),
        MediaClass::Image => format!("{} images", count),
        MediaClass::File if count == 1 => format!("File: {}", first.name),
        MediaClass::File => format!("{} files", count),
    })
}

fn markup_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<[^>]*>").ok())
        .as_ref()
}

/// Agent bodies arrive as HTML fragments; keep the text only
pub fn strip_markup(body: &str) -> String {
    let text = match markup_pattern() {
        Some(re) => re.replace_all(body, "").into_owned(),
        None => body.to_string(),
    };
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

/// A chat message; fields are fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    ordinal: Option<Ordinal>,
    source: MessageSource,
    author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
    sent_at: DateTime<Utc>,
}

impl Message {
    fn local(source: MessageSource, author: &str, body: &str) -> Self {
        Self {
            ordinal: None,
            source,
            author: author.to_string(),
            body: Some(body.to_string()),
            attachments: Vec::new(),
            sent_at: Utc::now(),
        }
    }

    pub fn ai(body: &str) -> Self {
        Self::local(MessageSource::Ai, AI_AUTHOR, body)
    }

    pub fn system(body: &str) -> Self {
        Self::local(MessageSource::System, SYSTEM_AUTHOR, body)
    }

    pub fn visitor(author: &str, body: &str) -> Self {
        Self::local(MessageSource::Visitor, author, body)
    }

    /// A visitor's shared file, optionally captioned
    pub fn visitor_attachment(author: &str, attachment: Attachment, caption: Option<&str>) -> Self {
        Self {
            ordinal: None,
            source: MessageSource::Visitor,
            author: author.to_string(),
            body: caption.filter(|c| !c.trim().is_empty()).map(str::to_string),
            attachments: vec![attachment],
            sent_at: Utc::now(),
        }
    }

    /// An agent message received from the service
    pub fn agent(wire: &WireMessage) -> Self {
        Self {
            ordinal: Some(wire.id),
            source: MessageSource::Agent,
            author: wire
                .author
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| AGENT_AUTHOR.to_string()),
            body: wire
                .body
                .as_deref()
                .map(strip_markup)
                .filter(|b| !b.is_empty()),
            attachments: wire.attachments.iter().map(Attachment::from_wire).collect(),
            sent_at: Utc::now(),
        }
    }

    pub fn ordinal(&self) -> Option<Ordinal> {
        self.ordinal
    }

    pub fn source(&self) -> MessageSource {
        self.source
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Body text, or the attachment summary when there is no body
    pub fn display_text(&self) -> String {
        match self.body.as_deref() {
            Some(body) if !body.trim().is_empty() => body.to_string(),
            _ => attachment_summary(&self.attachments).unwrap_or_default(),
        }
    }
}
