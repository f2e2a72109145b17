// ABOUTME: Test helpers for code that depends on ChatService and PushConnector.
// ABOUTME: Re-exports the scripted mocks together with a fluent builder.

pub mod mock_builder;

pub use crate::backends::mock::{MockChatService, MockPushConnector, ScriptedReply, ServiceCall};
pub use mock_builder::MockServiceBuilder;
