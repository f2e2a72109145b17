// ABOUTME: Scripted in-memory ChatService and PushConnector for tests.
// ABOUTME: Replies are consumed in order; every call is recorded for later assertions.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{Result, TransportError};
use crate::event::PushEvent;
use crate::traits::{ChatService, PushConnector, PushStream};
use crate::types::{
    ChatTurnRequest, ChatTurnResponse, FeedbackRequest, FileUpload, SessionId, WireMessage,
};

/// A call observed by the mock service
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    ChatTurn(ChatTurnRequest),
    Upload {
        session_id: SessionId,
        file_name: String,
    },
    Poll(SessionId),
    Status(SessionId),
    Feedback(FeedbackRequest),
    EndSession(SessionId),
}

/// One scripted chat reply, optionally delayed
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub delay: Option<Duration>,
    pub result: Result<ChatTurnResponse>,
}

#[derive(Default)]
struct ServiceScript {
    chat: VecDeque<ScriptedReply>,
    polls: VecDeque<Result<Vec<WireMessage>>>,
    statuses: VecDeque<Result<bool>>,
    uploads: VecDeque<Result<()>>,
    end_session: VecDeque<Result<()>>,
    calls: Vec<ServiceCall>,
}

/// Scripted ChatService.
///
/// When a queue is empty the mock answers with a benign default: an empty
/// AI reply, no poll messages, an active session, successful uploads.
#[derive(Default)]
pub struct MockChatService {
    script: Mutex<ServiceScript>,
}

impl MockChatService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chat_reply(&self, reply: ScriptedReply) {
        self.script.lock().unwrap().chat.push_back(reply);
    }

    pub fn push_poll(&self, result: Result<Vec<WireMessage>>) {
        self.script.lock().unwrap().polls.push_back(result);
    }

    pub fn push_status(&self, result: Result<bool>) {
        self.script.lock().unwrap().statuses.push_back(result);
    }

    pub fn push_upload(&self, result: Result<()>) {
        self.script.lock().unwrap().uploads.push_back(result);
    }

    pub fn push_end_session(&self, result: Result<()>) {
        self.script.lock().unwrap().end_session.push_back(result);
    }

    /// All calls observed so far, in order
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Chat turn requests observed so far
    pub fn chat_requests(&self) -> Vec<ChatTurnRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::ChatTurn(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    /// Number of calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&ServiceCall) -> bool) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    fn record(&self, call: ServiceCall) {
        self.script.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn send_chat_turn(&self, request: &ChatTurnRequest) -> Result<ChatTurnResponse> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(ServiceCall::ChatTurn(request.clone()));
            script.chat.pop_front()
        };
        let Some(reply) = reply else {
            return Ok(ChatTurnResponse::text(""));
        };
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.result
    }

    async fn upload_file(&self, session_id: &SessionId, upload: &FileUpload) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ServiceCall::Upload {
            session_id: session_id.clone(),
            file_name: upload.file_name.clone(),
        });
        script.uploads.pop_front().unwrap_or(Ok(()))
    }

    async fn poll_messages(&self, session_id: &SessionId) -> Result<Vec<WireMessage>> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ServiceCall::Poll(session_id.clone()));
        script.polls.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn session_status(&self, session_id: &SessionId) -> Result<bool> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ServiceCall::Status(session_id.clone()));
        script.statuses.pop_front().unwrap_or(Ok(true))
    }

    async fn submit_feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        self.record(ServiceCall::Feedback(feedback.clone()));
        Ok(())
    }

    async fn end_session(&self, session_id: &SessionId) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ServiceCall::EndSession(session_id.clone()));
        script.end_session.pop_front().unwrap_or(Ok(()))
    }
}

// =============================================================================
// Push
// =============================================================================

#[derive(Default)]
struct PushState {
    refuse_all: bool,
    pending_failures: u32,
    connect_attempts: u32,
    live: Option<mpsc::UnboundedSender<Result<PushEvent>>>,
    sessions: Vec<SessionId>,
}

/// Push connector whose connections are fed by the test.
///
/// Cloning shares state, so a test keeps one clone and hands the other to
/// the code under test.
#[derive(Clone, Default)]
pub struct MockPushConnector {
    state: Arc<Mutex<PushState>>,
}

impl MockPushConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `n` connection attempts
    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().pending_failures += n;
    }

    /// Refuse every connection attempt from now on
    pub fn refuse_all(&self) {
        self.state.lock().unwrap().refuse_all = true;
    }

    /// Deliver an event on the live connection; false if none is open
    pub fn push(&self, event: PushEvent) -> bool {
        self.push_result(Ok(event))
    }

    /// Deliver a raw stream item (e.g. a malformed payload error)
    pub fn push_result(&self, item: Result<PushEvent>) -> bool {
        let state = self.state.lock().unwrap();
        match &state.live {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }

    /// Close the live connection as if the server went away
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().live = None;
    }

    /// Whether a connection is open and its consumer still listening
    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .live
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    pub fn connect_attempts(&self) -> u32 {
        self.state.lock().unwrap().connect_attempts
    }

    /// Session ids passed to `connect`, in order
    pub fn sessions(&self) -> Vec<SessionId> {
        self.state.lock().unwrap().sessions.clone()
    }
}

#[async_trait]
impl PushConnector for MockPushConnector {
    async fn connect(&self, session_id: &SessionId) -> Result<PushStream> {
        let mut state = self.state.lock().unwrap();
        state.connect_attempts += 1;
        state.sessions.push(session_id.clone());

        if state.refuse_all {
            return Err(TransportError::ChannelDropped("connection refused".to_string()));
        }
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(TransportError::ChannelDropped("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.live = Some(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}
