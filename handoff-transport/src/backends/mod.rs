// ABOUTME: Concrete ChatService and PushConnector implementations.
// ABOUTME: HTTP via reqwest, push via tokio-tungstenite, scripted mocks for tests.

pub mod http;
pub mod mock;
pub mod websocket;

pub use http::HttpChatService;
pub use mock::{MockChatService, MockPushConnector, ServiceCall};
pub use websocket::WebSocketConnector;
