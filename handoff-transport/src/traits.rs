// ABOUTME: Service contracts the session core depends on.
// ABOUTME: ChatService covers request/response calls; PushConnector opens the push stream.

use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

use crate::error::Result;
use crate::event::PushEvent;
use crate::types::{
    ChatTurnRequest, ChatTurnResponse, FeedbackRequest, FileUpload, SessionId, WireMessage,
};

/// Boxed stream of push events for one connection.
///
/// `Err(MalformedPushPayload)` items are per-frame and leave the stream open;
/// any other error is followed by the end of the stream.
pub type PushStream = Pin<Box<dyn Stream<Item = Result<PushEvent>> + Send>>;

/// Request/response side of the chat service
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one visitor chat turn and return the service's reply
    async fn send_chat_turn(&self, request: &ChatTurnRequest) -> Result<ChatTurnResponse>;

    /// Share a file with the agent in an existing session
    async fn upload_file(&self, session_id: &SessionId, upload: &FileUpload) -> Result<()>;

    /// Fetch the session's messages, ordered by ordinal
    async fn poll_messages(&self, session_id: &SessionId) -> Result<Vec<WireMessage>>;

    /// Whether the service still considers the session open
    async fn session_status(&self, session_id: &SessionId) -> Result<bool>;

    /// Record the visitor's rating
    async fn submit_feedback(&self, feedback: &FeedbackRequest) -> Result<()>;

    /// Tell the service the visitor ended the session
    async fn end_session(&self, session_id: &SessionId) -> Result<()>;
}

/// Push side of the chat service
#[async_trait]
pub trait PushConnector: Send + Sync {
    /// Open a push connection scoped to `session_id`
    async fn connect(&self, session_id: &SessionId) -> Result<PushStream>;
}
