// ABOUTME: Local checks a file must pass before it is sent to the service.
// ABOUTME: Mirrors the service's accepted MIME list so doomed uploads never leave the client.

use handoff_transport::FileUpload;
use thiserror::Error;

/// MIME types the chat service accepts on /upload-file
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/zip",
    "application/x-zip-compressed",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "video/mp4",
    "video/avi",
    "video/quicktime",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejected {
    #[error("file type {0} is not supported")]
    UnsupportedType(String),
    #[error("file is {size} bytes, the limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("files can only be shared with a human agent")]
    NoSession,
}

pub fn is_allowed_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&essence.as_str())
}

pub fn validate_upload(upload: &FileUpload, max_bytes: u64) -> Result<(), UploadRejected> {
    if !is_allowed_mime(&upload.mime_type) {
        return Err(UploadRejected::UnsupportedType(upload.mime_type.clone()));
    }
    if upload.size() > max_bytes {
        return Err(UploadRejected::TooLarge {
            size: upload.size(),
            limit: max_bytes,
        });
    }
    Ok(())
}
