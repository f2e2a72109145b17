// ABOUTME: reqwest-backed ChatService talking to the middleware's REST endpoints.
// ABOUTME: Maps non-success statuses to TransportError::Status with the service's detail text.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::traits::ChatService;
use crate::types::{
    ChatTurnRequest, ChatTurnResponse, EndSessionRequest, FeedbackRequest, FileUpload,
    MessagesResponse, SessionId, StatusResponse, WireMessage,
};

/// HTTP client for the chat middleware
#[derive(Debug, Clone)]
pub struct HttpChatService {
    base_url: String,
    http: Client,
}

impl HttpChatService {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self::with_client(base_url, http))
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build `{base}/{prefix}/{session_id}/{suffix..}` with the id percent-encoded
    fn session_url(&self, prefix: &str, session_id: &SessionId, suffix: &[&str]) -> Result<String> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::InvalidRequest(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .push(prefix)
            .push(session_id.as_str())
            .extend(suffix);
        Ok(url.to_string())
    }

    /// Turn an error response into a Status error, preferring FastAPI's `detail`
    async fn parse_error(response: reqwest::Response) -> TransportError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorDetail>().await {
            Ok(body) => body.detail,
            Err(_) => format!("HTTP {}", status),
        };
        TransportError::Status { status, message }
    }

    async fn json_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| TransportError::Decode(e.to_string()))
        } else {
            Err(Self::parse_error(response).await)
        }
    }

    async fn empty_response(response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(response).await)
        }
    }
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send_chat_turn(&self, request: &ChatTurnRequest) -> Result<ChatTurnResponse> {
        let response = self.http.post(self.url("/chat")).json(request).send().await?;
        Self::json_response(response).await
    }

    async fn upload_file(&self, session_id: &SessionId, upload: &FileUpload) -> Result<()> {
        let part = Part::bytes(upload.data.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("session_id", session_id.to_string())
            .text("message", upload.caption.clone().unwrap_or_default());

        tracing::debug!(
            session_id = %session_id,
            file = %upload.file_name,
            size = upload.size(),
            "Uploading file"
        );

        let response = self
            .http
            .post(self.url("/upload-file"))
            .multipart(form)
            .send()
            .await?;
        Self::empty_response(response).await
    }

    async fn poll_messages(&self, session_id: &SessionId) -> Result<Vec<WireMessage>> {
        let url = self.session_url("messages", session_id, &[])?;
        let response = self.http.get(&url).send().await?;
        let mut body: MessagesResponse = Self::json_response(response).await?;
        body.messages.sort_by_key(|m| m.id);
        Ok(body.messages)
    }

    async fn session_status(&self, session_id: &SessionId) -> Result<bool> {
        let url = self.session_url("session", session_id, &["status"])?;
        let response = self.http.get(&url).send().await?;
        let body: StatusResponse = Self::json_response(response).await?;
        Ok(body.active)
    }

    async fn submit_feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        let response = self
            .http
            .post(self.url("/feedback"))
            .json(feedback)
            .send()
            .await?;
        Self::empty_response(response).await
    }

    async fn end_session(&self, session_id: &SessionId) -> Result<()> {
        let body = EndSessionRequest {
            session_id: session_id.clone(),
        };
        let response = self
            .http
            .post(self.url("/end-session"))
            .json(&body)
            .send()
            .await?;
        Self::empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_new_trims_trailing_slash() {
        let service = HttpChatService::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(service.base_url(), "http://localhost:8000");
    }

    #[test]
    fn session_url_escapes_reserved_characters() {
        let service = HttpChatService::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        assert_eq!(
            service.session_url("messages", &SessionId::new("42"), &[]).unwrap(),
            "http://localhost:8000/messages/42"
        );
        assert_eq!(
            service
                .session_url("session", &SessionId::new("a/b c"), &["status"])
                .unwrap(),
            "http://localhost:8000/session/a%2Fb%20c/status"
        );
    }

    #[test]
    fn session_url_keeps_base_path() {
        let service =
            HttpChatService::new("https://example.com/widget/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            service.session_url("messages", &SessionId::new("7"), &[]).unwrap(),
            "https://example.com/widget/messages/7"
        );
    }
}
