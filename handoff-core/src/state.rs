// ABOUTME: Lifecycle states and the per-handoff Session record.
// ABOUTME: Session owns the dedup high-water mark; ordinals at or below it are never processed again.

use handoff_transport::{Ordinal, SessionId};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AiOnly,
    HandoffRequested,
    AwaitingAgent,
    ConnectedToAgent,
    Ended,
    EndedByUser,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Ended | SessionState::EndedByUser)
    }

    /// A human-routed session is open
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::AwaitingAgent | SessionState::ConnectedToAgent
        )
    }

    /// States in which a handoff reply may create the session
    pub fn accepts_handoff(self) -> bool {
        matches!(self, SessionState::AiOnly | SessionState::HandoffRequested)
    }

    pub fn can_end_by_user(self) -> bool {
        matches!(
            self,
            SessionState::AiOnly | SessionState::AwaitingAgent | SessionState::ConnectedToAgent
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::AiOnly => "AI assistant",
            SessionState::HandoffRequested => "requesting a human agent",
            SessionState::AwaitingAgent => "waiting for an agent",
            SessionState::ConnectedToAgent => "connected to an agent",
            SessionState::Ended => "ended",
            SessionState::EndedByUser => "ended by you",
        };
        f.write_str(label)
    }
}

/// A human-routed session created by the first accepted handoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    id: SessionId,
    last_seen_ordinal: Option<Ordinal>,
    human_connected: bool,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            last_seen_ordinal: None,
            human_connected: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn last_seen_ordinal(&self) -> Option<Ordinal> {
        self.last_seen_ordinal
    }

    pub fn human_connected(&self) -> bool {
        self.human_connected
    }

    /// True when `ordinal` is above the high-water mark
    pub fn is_unseen(&self, ordinal: Ordinal) -> bool {
        self.last_seen_ordinal.map_or(true, |seen| ordinal > seen)
    }

    /// Advance the high-water mark; returns false if `ordinal` was already seen
    pub fn observe(&mut self, ordinal: Ordinal) -> bool {
        if !self.is_unseen(ordinal) {
            return false;
        }
        self.last_seen_ordinal = Some(ordinal);
        true
    }

    pub(crate) fn mark_human_connected(&mut self) {
        self.human_connected = true;
    }

    pub(crate) fn mark_closed(&mut self) {
        self.human_connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_is_monotonic() {
        let mut session = Session::new(SessionId::new("42"));
        assert!(session.observe(5));
        assert!(!session.observe(5));
        assert!(!session.observe(3));
        assert!(session.observe(6));
        assert_eq!(session.last_seen_ordinal(), Some(6));
    }

    #[test]
    fn test_ordinal_zero_is_unseen_initially() {
        let mut session = Session::new(SessionId::new("1"));
        assert!(session.observe(0));
        assert!(!session.observe(0));
    }

    #[test]
    fn test_state_predicates() {
        assert!(SessionState::Ended.is_terminal());
        assert!(SessionState::EndedByUser.is_terminal());
        assert!(!SessionState::HandoffRequested.can_end_by_user());
        assert!(SessionState::HandoffRequested.accepts_handoff());
        assert!(!SessionState::AwaitingAgent.accepts_handoff());
        assert!(SessionState::ConnectedToAgent.is_live());
    }
}
