// ABOUTME: Fluent builder for scripting a MockChatService.
// ABOUTME: Queues chat replies, poll batches and status answers in the order they are declared.

use std::sync::Arc;
use std::time::Duration;

use crate::backends::mock::{MockChatService, ScriptedReply};
use crate::error::TransportError;
use crate::types::{ChatTurnResponse, SessionId, WireMessage};

/// Builds a MockChatService with a scripted conversation
pub struct MockServiceBuilder {
    service: MockChatService,
    pending: Option<ScriptedReply>,
}

impl MockServiceBuilder {
    pub fn new() -> Self {
        Self {
            service: MockChatService::new(),
            pending: None,
        }
    }

    /// Next chat turn gets a plain AI reply
    pub fn reply_text(self, text: &str) -> Self {
        self.reply(Ok(ChatTurnResponse::text(text)))
    }

    /// Next chat turn hands off to `session_id`
    pub fn reply_handoff(self, text: &str, session_id: &str) -> Self {
        self.reply(Ok(ChatTurnResponse::handoff(text, SessionId::new(session_id))))
    }

    /// Next chat turn reports the session as closed
    pub fn reply_session_ended(self) -> Self {
        self.reply(Ok(ChatTurnResponse::text(crate::types::SESSION_ENDED_SENTINEL)))
    }

    /// Next chat turn fails
    pub fn reply_error(self, error: TransportError) -> Self {
        self.reply(Err(error))
    }

    /// Next chat turn answers with an arbitrary response body
    pub fn reply_with(self, response: ChatTurnResponse) -> Self {
        self.reply(Ok(response))
    }

    /// Delay the most recently declared chat reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        if let Some(reply) = &mut self.pending {
            reply.delay = Some(delay);
        }
        self
    }

    /// Next poll returns these messages
    pub fn poll(self, messages: Vec<WireMessage>) -> Self {
        self.service.push_poll(Ok(messages));
        self
    }

    /// Next poll fails
    pub fn poll_error(self, error: TransportError) -> Self {
        self.service.push_poll(Err(error));
        self
    }

    /// Next status check answers `active`
    pub fn status(self, active: bool) -> Self {
        self.service.push_status(Ok(active));
        self
    }

    /// Next upload fails
    pub fn upload_error(self, error: TransportError) -> Self {
        self.service.push_upload(Err(error));
        self
    }

    pub fn build(mut self) -> Arc<MockChatService> {
        self.flush();
        Arc::new(self.service)
    }

    fn reply(mut self, result: crate::error::Result<ChatTurnResponse>) -> Self {
        self.flush();
        self.pending = Some(ScriptedReply {
            delay: None,
            result,
        });
        self
    }

    fn flush(&mut self) {
        if let Some(reply) = self.pending.take() {
            self.service.push_chat_reply(reply);
        }
    }
}

impl Default for MockServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
