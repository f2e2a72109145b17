// ABOUTME: Events the session core emits for rendering and the sink trait that renders them.
// ABOUTME: Sinks see messages already ordered and deduplicated; they never hold session state.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::message::Message;

// =============================================================================
// Affordances
// =============================================================================

/// What the connection badge shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionIndicator {
    AiAssistant,
    WaitingForAgent,
    HumanAgent,
    Reconnecting,
    /// Push channel gave up; updates arrive by polling only
    Offline,
    Ended,
}

/// Transient activity shown next to the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    Typing,
    Uploading,
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum SinkEvent {
    AppendMessage(Message),
    SetInputEnabled(bool),
    SetRequestHumanEnabled(bool),
    SetConnectionIndicator(ConnectionIndicator),
    SetActivity(Activity),
    ShowFeedbackPrompt,
    SetRatingEnabled(bool),
}

impl SinkEvent {
    pub fn message(&self) -> Option<&Message> {
        match self {
            SinkEvent::AppendMessage(m) => Some(m),
            _ => None,
        }
    }

    /// Hand this event to the matching sink method
    pub async fn deliver(&self, sink: &dyn PresentationSink) -> Result<()> {
        match self {
            SinkEvent::AppendMessage(m) => sink.append_message(m).await,
            SinkEvent::SetInputEnabled(on) => sink.set_input_enabled(*on).await,
            SinkEvent::SetRequestHumanEnabled(on) => sink.set_request_human_enabled(*on).await,
            SinkEvent::SetConnectionIndicator(i) => sink.set_connection_indicator(*i).await,
            SinkEvent::SetActivity(a) => sink.set_activity(*a).await,
            SinkEvent::ShowFeedbackPrompt => sink.show_feedback_prompt().await,
            SinkEvent::SetRatingEnabled(on) => sink.set_rating_enabled(*on).await,
        }
    }
}

/// Renders core output. Only `append_message` is mandatory.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn append_message(&self, message: &Message) -> Result<()>;

    async fn set_input_enabled(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    async fn set_request_human_enabled(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    async fn set_connection_indicator(&self, _indicator: ConnectionIndicator) -> Result<()> {
        Ok(())
    }

    async fn set_activity(&self, _activity: Activity) -> Result<()> {
        Ok(())
    }

    async fn show_feedback_prompt(&self) -> Result<()> {
        Ok(())
    }

    async fn set_rating_enabled(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }
}
