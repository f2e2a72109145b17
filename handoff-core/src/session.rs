// ABOUTME: The widget session state machine: AI chat, handoff, live agent session, end and rating.
// ABOUTME: Pure and synchronous; each input returns sink events to render and effects for the driver.

use handoff_transport::{
    ChatTurnRequest, ChatTurnResponse, FeedbackRequest, FileUpload, Ordinal, PushEvent, SessionId,
    TransportError, WireMessage,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::classifier::{LifecycleClassifier, LifecycleSignal, PhraseClassifier};
use crate::config::Config;
use crate::feedback::{Feedback, FeedbackError, Rating};
use crate::message::{strip_markup, Attachment, Message};
use crate::sink::{Activity, ConnectionIndicator, SinkEvent};
use crate::state::{Session, SessionState};
use crate::upload::{validate_upload, UploadRejected};

pub const GENERIC_FAILURE: &str = "Sorry, there was an error. Please try again.";
pub const UPLOAD_FAILURE: &str = "File upload failed. Please try again.";
pub const REQUESTING_HUMAN: &str = "Requesting human agent...";
pub const HUMAN_REQUEST_TEXT: &str = "I would like to speak with a human agent.";
pub const AGENT_JOINED: &str = "Agent joined the chat";
pub const AGENT_ENDED: &str = "The agent has ended the conversation.";
pub const AGENT_LEFT: &str = "Agent has left the chat";
pub const SESSION_CLOSED: &str = "This conversation has ended.";
pub const USER_ENDED: &str = "You ended the conversation.";
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";
pub const PUSH_OFFLINE: &str =
    "Live updates are unavailable. New messages will keep arriving every few seconds.";

/// Correlates a spawned request with its completion
pub type RequestId = u64;

/// I/O the driver performs on the core's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendChatTurn {
        request_id: RequestId,
        request: ChatTurnRequest,
    },
    UploadFile {
        request_id: RequestId,
        session_id: SessionId,
        upload: FileUpload,
    },
    OpenPush(SessionId),
    ClosePush,
    StartPolling(SessionId),
    StopPolling,
    /// Deliver `feedback_prompt_due(generation)` after `delay`
    ScheduleFeedbackPrompt {
        delay: Duration,
        generation: u64,
    },
    /// Best-effort, never retried
    NotifySessionEnd(SessionId),
    /// Best-effort, never retried
    SubmitFeedback(FeedbackRequest),
}

/// Result of applying one input to the core
#[derive(Debug, Default)]
pub struct Outcome {
    pub events: Vec<SinkEvent>,
    pub effects: Vec<Effect>,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.effects.is_empty()
    }

    /// Messages appended by this outcome, in order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.events.iter().filter_map(SinkEvent::message)
    }

    fn emit(&mut self, event: SinkEvent) {
        self.events.push(event);
    }

    fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}

/// One polling tick's findings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    pub messages: Vec<WireMessage>,
    /// `None` when the status check is disabled or failed
    pub active: Option<bool>,
}

/// Tunables the core needs, usually taken from [`Config`]
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub visitor_name: String,
    pub greeting: String,
    pub feedback_delay: Duration,
    pub max_upload_bytes: u64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CoreSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            visitor_name: config.widget.visitor_name.clone(),
            greeting: config.widget.greeting.clone(),
            feedback_delay: config.feedback_delay(),
            max_upload_bytes: config.widget.max_upload_bytes,
        }
    }
}

/// Point-in-time view for status displays and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub session_id: Option<SessionId>,
    pub human_connected: bool,
    pub last_seen_ordinal: Option<Ordinal>,
    pub degraded: bool,
    pub indicator: ConnectionIndicator,
    pub activity: Activity,
    pub input_enabled: bool,
    pub feedback_submitted: bool,
    pub chat_turns_in_flight: usize,
    pub uploads_in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnKind {
    Chat,
    HumanRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndKind {
    Remote,
    ByUser,
}

pub struct SessionCore {
    settings: CoreSettings,
    classifier: Box<dyn LifecycleClassifier>,
    state: SessionState,
    session: Option<Session>,
    /// Bumped by `reset`; stale timers carry an older value
    generation: u64,
    next_request_id: RequestId,
    chat_turns: HashMap<RequestId, TurnKind>,
    uploads: HashSet<RequestId>,
    degraded: bool,
    feedback: Option<Feedback>,
    feedback_prompt_shown: bool,
    input_enabled: bool,
    indicator: ConnectionIndicator,
    activity: Activity,
}

impl SessionCore {
    pub fn new(settings: CoreSettings) -> Self {
        Self::with_classifier(settings, Box::new(PhraseClassifier::default()))
    }

    pub fn with_classifier(
        settings: CoreSettings,
        classifier: Box<dyn LifecycleClassifier>,
    ) -> Self {
        Self {
            settings,
            classifier,
            state: SessionState::AiOnly,
            session: None,
            generation: 0,
            next_request_id: 1,
            chat_turns: HashMap::new(),
            uploads: HashSet::new(),
            degraded: false,
            feedback: None,
            feedback_prompt_shown: false,
            input_enabled: true,
            indicator: ConnectionIndicator::AiAssistant,
            activity: Activity::Idle,
        }
    }

    /// Settings and left-phrase classifier taken from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let classifier = PhraseClassifier::new(&config.poll.left_phrases)?;
        Ok(Self::with_classifier(
            CoreSettings::from_config(config),
            Box::new(classifier),
        ))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(Session::id)
    }

    pub fn human_connected(&self) -> bool {
        self.session.as_ref().is_some_and(Session::human_connected)
    }

    pub fn last_seen_ordinal(&self) -> Option<Ordinal> {
        self.session.as_ref().and_then(Session::last_seen_ordinal)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            session_id: self.session_id().cloned(),
            human_connected: self.human_connected(),
            last_seen_ordinal: self.last_seen_ordinal(),
            degraded: self.degraded,
            indicator: self.indicator,
            activity: self.activity,
            input_enabled: self.input_enabled,
            feedback_submitted: self.feedback.is_some(),
            chat_turns_in_flight: self.chat_turns.len(),
            uploads_in_flight: self.uploads.len(),
        }
    }

    // =========================================================================
    // User intents
    // =========================================================================

    /// Initial render: affordances plus the greeting
    pub fn start(&mut self) -> Outcome {
        let mut out = Outcome::default();
        self.render_fresh(&mut out);
        out
    }

    pub fn send_text(&mut self, text: &str) -> Outcome {
        let mut out = Outcome::default();
        let text = text.trim();
        if text.is_empty() {
            return out;
        }
        if self.state.is_terminal() {
            tracing::debug!(state = ?self.state, "Ignoring send after session end");
            return out;
        }

        out.emit(SinkEvent::AppendMessage(Message::visitor(
            &self.settings.visitor_name,
            text,
        )));
        self.issue_chat_turn(&mut out, text, TurnKind::Chat);
        out
    }

    /// Ask the assistant to route the visitor to a human
    pub fn request_human(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if self.state != SessionState::AiOnly {
            tracing::debug!(state = ?self.state, "Human request ignored");
            return out;
        }

        tracing::info!("Visitor requested a human agent");
        self.state = SessionState::HandoffRequested;
        out.emit(SinkEvent::AppendMessage(Message::system(REQUESTING_HUMAN)));
        out.emit(SinkEvent::SetRequestHumanEnabled(false));
        self.issue_chat_turn(&mut out, HUMAN_REQUEST_TEXT, TurnKind::HumanRequest);
        out
    }

    /// Share a file with the agent; rejected locally before any request is made
    pub fn attach_file(&mut self, upload: FileUpload) -> Result<Outcome, UploadRejected> {
        let session_id = match (&self.session, self.state.is_live()) {
            (Some(session), true) => session.id().clone(),
            _ => return Err(UploadRejected::NoSession),
        };
        validate_upload(&upload, self.settings.max_upload_bytes)?;

        let mut out = Outcome::default();
        let request_id = self.next_request_id();
        self.uploads.insert(request_id);

        let attachment = Attachment::new(&upload.file_name, &upload.mime_type, upload.size());
        out.emit(SinkEvent::AppendMessage(Message::visitor_attachment(
            &self.settings.visitor_name,
            attachment,
            upload.caption.as_deref(),
        )));
        tracing::info!(
            session_id = %session_id,
            file = %upload.file_name,
            size = upload.size(),
            "Uploading file"
        );
        out.effect(Effect::UploadFile {
            request_id,
            session_id,
            upload,
        });
        self.refresh_activity(&mut out);
        Ok(out)
    }

    /// Visitor closes the conversation
    pub fn end_by_user(&mut self) -> Outcome {
        let mut out = Outcome::default();
        if !self.state.can_end_by_user() {
            tracing::debug!(state = ?self.state, "End request ignored");
            return out;
        }
        self.terminate(&mut out, EndKind::ByUser, USER_ENDED);
        out
    }

    /// Record the visitor's rating; accepted once per session
    pub fn rate(&mut self, score: u8, comment: Option<String>) -> Result<Outcome, FeedbackError> {
        if self.feedback.is_some() {
            return Err(FeedbackError::AlreadySubmitted);
        }
        let rating = Rating::new(score)?;
        let comment = comment.filter(|c| !c.trim().is_empty());

        let feedback = Feedback {
            session_id: self.session_id().cloned(),
            rating,
            comment,
        };
        let mut out = Outcome::default();
        out.emit(SinkEvent::AppendMessage(Message::system(FEEDBACK_THANKS)));
        out.emit(SinkEvent::SetRatingEnabled(false));
        if let Some(request) = feedback.to_request() {
            out.effect(Effect::SubmitFeedback(request));
        }

        tracing::info!(rating = rating.value(), session_id = ?feedback.session_id, "Feedback recorded");
        self.feedback = Some(feedback);
        self.feedback_prompt_shown = true;
        Ok(out)
    }

    /// Drop the current session and start over in AI mode
    pub fn reset(&mut self) -> Outcome {
        let mut out = Outcome::default();
        let previous = self.session.take();
        tracing::info!(
            previous_session = ?previous.as_ref().map(Session::id),
            "Starting a new conversation"
        );

        self.generation += 1;
        self.state = SessionState::AiOnly;
        self.chat_turns.clear();
        self.uploads.clear();
        self.degraded = false;
        self.feedback = None;
        let prompt_was_shown = std::mem::take(&mut self.feedback_prompt_shown);

        out.effect(Effect::StopPolling);
        out.effect(Effect::ClosePush);
        if prompt_was_shown {
            out.emit(SinkEvent::SetRatingEnabled(false));
        }
        self.render_fresh(&mut out);
        out
    }

    // =========================================================================
    // Completions and transport events
    // =========================================================================

    pub fn chat_turn_completed(
        &mut self,
        request_id: RequestId,
        result: Result<ChatTurnResponse, TransportError>,
    ) -> Outcome {
        let mut out = Outcome::default();
        let Some(kind) = self.chat_turns.remove(&request_id) else {
            tracing::debug!(request_id, "Dropping reply for a discarded chat turn");
            return out;
        };

        if self.state.is_terminal() {
            tracing::debug!(request_id, "Dropping chat reply after session end");
            self.refresh_activity(&mut out);
            return out;
        }

        match result {
            Ok(reply) if reply.is_session_ended() => {
                if self.state.is_live() {
                    self.terminate(&mut out, EndKind::Remote, SESSION_CLOSED);
                } else {
                    self.abandon_human_request(&mut out, kind);
                }
            }
            Ok(reply) => self.apply_reply(&mut out, kind, reply),
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Chat turn failed");
                out.emit(SinkEvent::AppendMessage(Message::system(GENERIC_FAILURE)));
                self.abandon_human_request(&mut out, kind);
            }
        }

        self.refresh_activity(&mut out);
        out
    }

    pub fn upload_completed(
        &mut self,
        request_id: RequestId,
        result: Result<(), TransportError>,
    ) -> Outcome {
        let mut out = Outcome::default();
        if !self.uploads.remove(&request_id) {
            tracing::debug!(request_id, "Dropping completion for a discarded upload");
            return out;
        }
        if let Err(e) = result {
            tracing::warn!(request_id, error = %e, "File upload failed");
            out.emit(SinkEvent::AppendMessage(Message::system(UPLOAD_FAILURE)));
        }
        self.refresh_activity(&mut out);
        out
    }

    pub fn push_event(&mut self, session_id: &SessionId, event: PushEvent) -> Outcome {
        let mut out = Outcome::default();
        if !self.is_current(session_id) {
            tracing::debug!(session_id = %session_id, "Dropping push event for a stale session");
            return out;
        }

        match event {
            PushEvent::Message(wire) => self.ingest_pushed(&mut out, wire),
            PushEvent::AgentJoined { message } => self.agent_joined(&mut out, message),
            PushEvent::SessionEnded { reason } => {
                if self.state.is_live() {
                    let reason = reason
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| AGENT_ENDED.to_string());
                    self.terminate(&mut out, EndKind::Remote, &reason);
                }
            }
            PushEvent::ShowFeedback => {
                if self.state.is_terminal() {
                    self.show_feedback_prompt(&mut out);
                }
            }
            PushEvent::Pong => {}
        }
        out
    }

    pub fn push_connected(&mut self, session_id: &SessionId) -> Outcome {
        let mut out = Outcome::default();
        if self.is_current(session_id) && self.state.is_live() {
            tracing::debug!(session_id = %session_id, "Push channel connected");
            let indicator = self.live_indicator();
            self.set_indicator(&mut out, indicator);
        }
        out
    }

    pub fn push_dropped(&mut self, session_id: &SessionId) -> Outcome {
        let mut out = Outcome::default();
        if self.is_current(session_id) && self.state.is_live() {
            self.set_indicator(&mut out, ConnectionIndicator::Reconnecting);
        }
        out
    }

    /// Reconnection gave up; polling becomes the only update path
    pub fn push_exhausted(&mut self, session_id: &SessionId) -> Outcome {
        let mut out = Outcome::default();
        if !self.is_current(session_id) || !self.state.is_live() || self.degraded {
            return out;
        }
        tracing::warn!(session_id = %session_id, "Push channel exhausted, relying on polling");
        self.degraded = true;
        out.emit(SinkEvent::AppendMessage(Message::system(PUSH_OFFLINE)));
        self.set_indicator(&mut out, ConnectionIndicator::Offline);
        out
    }

    pub fn poll_completed(&mut self, session_id: &SessionId, report: PollReport) -> Outcome {
        let mut out = Outcome::default();
        if !self.is_current(session_id) || !self.state.is_live() {
            return out;
        }

        let mut messages = report.messages;
        messages.sort_by_key(|m| m.id);
        for wire in messages {
            let echo = self.is_echo(&wire);
            let Some(session) = self.session.as_mut() else {
                break;
            };
            if !session.is_unseen(wire.id) {
                continue;
            }
            if echo {
                if self.degraded {
                    session.observe(wire.id);
                }
                continue;
            }

            let body = wire.body.as_deref().map(strip_markup);
            if let Some(body) = body.filter(|b| self.classifier.classify(b) == LifecycleSignal::AgentLeft) {
                session.observe(wire.id);
                tracing::info!(session_id = %session_id, ordinal = wire.id, "Poll detected agent leaving");
                self.terminate(&mut out, EndKind::Remote, &body);
                return out;
            }

            if self.degraded {
                session.observe(wire.id);
                tracing::debug!(session_id = %session_id, ordinal = wire.id, "Surfacing polled message");
                out.emit(SinkEvent::AppendMessage(Message::agent(&wire)));
            }
        }

        if report.active == Some(false) {
            tracing::info!(session_id = %session_id, "Service reports session inactive");
            self.terminate(&mut out, EndKind::Remote, AGENT_LEFT);
        }
        out
    }

    /// Timer from `Effect::ScheduleFeedbackPrompt` fired
    pub fn feedback_prompt_due(&mut self, generation: u64) -> Outcome {
        let mut out = Outcome::default();
        if generation == self.generation && self.state.is_terminal() {
            self.show_feedback_prompt(&mut out);
        }
        out
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn is_current(&self, session_id: &SessionId) -> bool {
        self.session_id() == Some(session_id)
    }

    fn is_echo(&self, wire: &WireMessage) -> bool {
        wire.author.as_deref().map(str::trim) == Some(self.settings.visitor_name.as_str())
    }

    fn issue_chat_turn(&mut self, out: &mut Outcome, text: &str, kind: TurnKind) {
        let request_id = self.next_request_id();
        self.chat_turns.insert(request_id, kind);
        let request = ChatTurnRequest::new(text, &self.settings.visitor_name, self.session_id());
        out.effect(Effect::SendChatTurn {
            request_id,
            request,
        });
        self.refresh_activity(out);
    }

    fn apply_reply(&mut self, out: &mut Outcome, kind: TurnKind, reply: ChatTurnResponse) {
        let handoff_target = match &reply.session_id {
            Some(sid) if reply.handoff_needed => Some(sid.clone()),
            _ => None,
        };

        match handoff_target {
            Some(sid) if self.session.is_none() && self.state.accepts_handoff() => {
                self.accept_handoff(out, sid, &reply.response);
            }
            _ => {
                if reply.handoff_needed && self.session.is_some() {
                    tracing::debug!(
                        session_id = ?self.session_id(),
                        "Ignoring handoff signal for an existing session"
                    );
                }
                self.abandon_human_request(out, kind);
                if !reply.response.trim().is_empty() {
                    out.emit(SinkEvent::AppendMessage(Message::ai(&reply.response)));
                }
            }
        }
    }

    fn accept_handoff(&mut self, out: &mut Outcome, session_id: SessionId, text: &str) {
        tracing::info!(session_id = %session_id, "Handoff accepted, waiting for an agent");
        self.session = Some(Session::new(session_id.clone()));
        self.state = SessionState::AwaitingAgent;

        // A rating given to the assistant alone does not count for the human session
        if self.feedback.as_ref().is_some_and(|f| f.session_id.is_none()) {
            self.feedback = None;
            self.feedback_prompt_shown = false;
        }

        if !text.trim().is_empty() {
            out.emit(SinkEvent::AppendMessage(Message::system(text)));
        }
        out.emit(SinkEvent::SetRequestHumanEnabled(false));
        self.set_indicator(out, ConnectionIndicator::WaitingForAgent);
        out.effect(Effect::OpenPush(session_id.clone()));
        out.effect(Effect::StartPolling(session_id));
    }

    /// A human request that did not produce a handoff returns to AI chat
    fn abandon_human_request(&mut self, out: &mut Outcome, kind: TurnKind) {
        if kind == TurnKind::HumanRequest && self.state == SessionState::HandoffRequested {
            tracing::info!("Human request did not lead to a handoff");
            self.state = SessionState::AiOnly;
            out.emit(SinkEvent::SetRequestHumanEnabled(true));
        }
    }

    fn agent_joined(&mut self, out: &mut Outcome, message: Option<String>) {
        if self.state != SessionState::AwaitingAgent {
            tracing::debug!(state = ?self.state, "Ignoring agent_joined");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        tracing::info!(session_id = %session.id(), "Agent joined");
        session.mark_human_connected();
        self.state = SessionState::ConnectedToAgent;

        let text = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| AGENT_JOINED.to_string());
        out.emit(SinkEvent::AppendMessage(Message::system(&text)));
        out.emit(SinkEvent::SetRequestHumanEnabled(false));
        self.set_indicator(out, ConnectionIndicator::HumanAgent);
        self.refresh_activity(out);
    }

    fn ingest_pushed(&mut self, out: &mut Outcome, wire: WireMessage) {
        if !self.state.is_live() {
            return;
        }
        let echo = self.is_echo(&wire);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.observe(wire.id) {
            tracing::debug!(ordinal = wire.id, "Dropping duplicate message");
            return;
        }
        if echo {
            return;
        }

        let body = wire.body.as_deref().map(strip_markup);
        if let Some(body) = body.filter(|b| self.classifier.classify(b) == LifecycleSignal::AgentLeft) {
            tracing::info!(ordinal = wire.id, "Agent left the conversation");
            self.terminate(out, EndKind::Remote, &body);
            return;
        }
        out.emit(SinkEvent::AppendMessage(Message::agent(&wire)));
    }

    /// The single transition into Ended / EndedByUser
    fn terminate(&mut self, out: &mut Outcome, kind: EndKind, reason: &str) {
        if self.state.is_terminal() {
            return;
        }

        self.state = match kind {
            EndKind::Remote => SessionState::Ended,
            EndKind::ByUser => SessionState::EndedByUser,
        };
        self.input_enabled = false;
        if let Some(session) = self.session.as_mut() {
            session.mark_closed();
        }
        tracing::info!(
            session_id = ?self.session_id(),
            state = ?self.state,
            reason,
            "Session ended"
        );

        out.emit(SinkEvent::AppendMessage(Message::system(reason)));
        out.emit(SinkEvent::SetInputEnabled(false));
        out.emit(SinkEvent::SetRequestHumanEnabled(false));
        self.set_indicator(out, ConnectionIndicator::Ended);
        self.refresh_activity(out);

        if let Some(session_id) = self.session_id().cloned() {
            out.effect(Effect::StopPolling);
            out.effect(Effect::ClosePush);
            if kind == EndKind::ByUser {
                out.effect(Effect::NotifySessionEnd(session_id));
            }
        }
        out.effect(Effect::ScheduleFeedbackPrompt {
            delay: self.settings.feedback_delay,
            generation: self.generation,
        });
    }

    fn show_feedback_prompt(&mut self, out: &mut Outcome) {
        if self.feedback_prompt_shown || self.feedback.is_some() {
            return;
        }
        self.feedback_prompt_shown = true;
        out.emit(SinkEvent::ShowFeedbackPrompt);
        out.emit(SinkEvent::SetRatingEnabled(true));
    }

    /// Full affordance refresh used by `start` and `reset`
    fn render_fresh(&mut self, out: &mut Outcome) {
        self.input_enabled = true;
        self.indicator = ConnectionIndicator::AiAssistant;
        self.activity = Activity::Idle;
        out.emit(SinkEvent::SetInputEnabled(true));
        out.emit(SinkEvent::SetRequestHumanEnabled(true));
        out.emit(SinkEvent::SetConnectionIndicator(ConnectionIndicator::AiAssistant));
        out.emit(SinkEvent::SetActivity(Activity::Idle));
        if !self.settings.greeting.trim().is_empty() {
            out.emit(SinkEvent::AppendMessage(Message::ai(&self.settings.greeting)));
        }
    }

    fn live_indicator(&self) -> ConnectionIndicator {
        if self.degraded {
            ConnectionIndicator::Offline
        } else if self.state == SessionState::ConnectedToAgent {
            ConnectionIndicator::HumanAgent
        } else {
            ConnectionIndicator::WaitingForAgent
        }
    }

    fn set_indicator(&mut self, out: &mut Outcome, indicator: ConnectionIndicator) {
        if self.indicator != indicator {
            self.indicator = indicator;
            out.emit(SinkEvent::SetConnectionIndicator(indicator));
        }
    }

    fn refresh_activity(&mut self, out: &mut Outcome) {
        let activity = if self.state.is_terminal() {
            Activity::Idle
        } else if !self.uploads.is_empty() {
            Activity::Uploading
        } else if !self.chat_turns.is_empty() && !self.human_connected() {
            Activity::Typing
        } else {
            Activity::Idle
        };
        if self.activity != activity {
            self.activity = activity;
            out.emit(SinkEvent::SetActivity(activity));
        }
    }
}
