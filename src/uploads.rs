// ABOUTME: Reads a local file into a FileUpload for the /attach command.
// ABOUTME: The MIME type is guessed from the extension; the session core decides if it is allowed.

use anyhow::{Context, Result};
use handoff_transport::FileUpload;
use std::path::Path;

pub async fn load_upload(path: &Path, caption: Option<String>) -> Result<FileUpload> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} is not a file path", path.display()))?
        .to_string();

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    tracing::debug!(file = %file_name, mime_type = %mime_type, size = data.len(), "Loaded attachment");

    let upload = FileUpload::new(file_name, mime_type, data);
    Ok(match caption {
        Some(caption) => upload.with_caption(caption),
        None => upload,
    })
}
