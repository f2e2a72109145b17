// ABOUTME: Transport layer for the handoff chat service.
// ABOUTME: Wire types, service/push traits, HTTP + WebSocket backends, and scripted mocks.

pub mod backends;
pub mod error;
pub mod event;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{Result, TransportError};
pub use event::{parse_push_event, PushEvent, PING_FRAME};
pub use traits::{ChatService, PushConnector, PushStream};
pub use types::{
    ChatTurnRequest, ChatTurnResponse, EndSessionRequest, FeedbackRequest, FileUpload,
    MessagesResponse, Ordinal, SessionId, StatusResponse, WireAttachment, WireMessage,
    SESSION_ENDED_SENTINEL,
};
