// ABOUTME: Push-channel event types and the JSON frame parser.
// ABOUTME: Unknown or malformed frames become MalformedPushPayload, never a panic.

use serde::Deserialize;

use crate::error::{Result, TransportError};
use crate::types::WireMessage;

/// Keepalive frame the service answers with `{"type":"pong"}`
pub const PING_FRAME: &str = r#"{"type":"ping"}"#;

/// Events delivered over the session-scoped push channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// A chat message posted to the session (agent or echo of the visitor)
    Message(WireMessage),
    /// A human agent joined; carries the service's join text when present
    AgentJoined { message: Option<String> },
    /// The session was closed on the service side
    SessionEnded { reason: Option<String> },
    /// The service asks the widget to show the rating prompt now
    ShowFeedback,
    /// Keepalive reply
    Pong,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PushFrame {
    Message {
        data: WireMessage,
    },
    AgentJoined {
        #[serde(default)]
        message: Option<String>,
    },
    SessionEnded {
        #[serde(default)]
        message: Option<String>,
    },
    ShowFeedback {},
    Pong {},
}

/// Parse one text frame from the push channel
pub fn parse_push_event(text: &str) -> Result<PushEvent> {
    let frame: PushFrame = serde_json::from_str(text)
        .map_err(|e| TransportError::MalformedPushPayload(e.to_string()))?;

    Ok(match frame {
        PushFrame::Message { data } => PushEvent::Message(data),
        PushFrame::AgentJoined { message } => PushEvent::AgentJoined { message },
        PushFrame::SessionEnded { message } => PushEvent::SessionEnded { reason: message },
        PushFrame::ShowFeedback {} => PushEvent::ShowFeedback,
        PushFrame::Pong {} => PushEvent::Pong,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_event() {
        let event =
            parse_push_event(r#"{"type":"message","data":{"id":12,"author":"Mitchell","body":"Hi there"}}"#)
                .unwrap();
        assert_eq!(
            event,
            PushEvent::Message(WireMessage::new(12, "Mitchell", "Hi there"))
        );
    }

    #[test]
    fn parse_agent_joined_with_and_without_text() {
        assert_eq!(
            parse_push_event(r#"{"type":"agent_joined","message":"Mitchell joined the chat"}"#)
                .unwrap(),
            PushEvent::AgentJoined {
                message: Some("Mitchell joined the chat".to_string())
            }
        );
        assert_eq!(
            parse_push_event(r#"{"type":"agent_joined"}"#).unwrap(),
            PushEvent::AgentJoined { message: None }
        );
    }

    #[test]
    fn parse_session_ended_reason() {
        let event =
            parse_push_event(r#"{"type":"session_ended","message":"Agent ended chat"}"#).unwrap();
        assert_eq!(
            event,
            PushEvent::SessionEnded {
                reason: Some("Agent ended chat".to_string())
            }
        );
    }

    #[test]
    fn parse_show_feedback_and_pong() {
        assert_eq!(
            parse_push_event(r#"{"type":"show_feedback","message":"Please rate this conversation"}"#)
                .unwrap(),
            PushEvent::ShowFeedback
        );
        assert_eq!(parse_push_event(r#"{"type":"pong"}"#).unwrap(), PushEvent::Pong);
    }

    #[test]
    fn malformed_frames_are_reported() {
        for frame in [
            "not json",
            r#"{"type":"teleport"}"#,
            r#"{"type":"message"}"#,
            r#"{"type":"message","data":{"body":"no id"}}"#,
            r#"{"data":{}}"#,
        ] {
            let err = parse_push_event(frame).unwrap_err();
            assert!(err.is_malformed_payload(), "frame {frame} gave {err:?}");
        }
    }
}
