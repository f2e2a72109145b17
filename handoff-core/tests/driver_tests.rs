// ABOUTME: End-to-end tests for SessionDriver against the scripted service and push mocks.
// ABOUTME: Runs on paused tokio time so backoff, polling and feedback timers complete instantly.

mod common;

use common::{wait_until, RecordingSink};
use handoff_core::poller::PollSettings;
use handoff_core::session::{AGENT_JOINED, PUSH_OFFLINE, USER_ENDED};
use handoff_core::{
    BackoffConfig, ConnectionIndicator, CoreSettings, DriverSettings, FeedbackError,
    MessageSource, PushEvent, SessionCore, SessionDriver, SessionState, SinkEvent, UploadRejected,
    WidgetError, WidgetHandle,
};
use handoff_transport::testing::{MockChatService, MockPushConnector, MockServiceBuilder, ServiceCall};
use handoff_transport::{FileUpload, TransportError, WireMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Harness {
    handle: WidgetHandle,
    join: JoinHandle<()>,
    service: Arc<MockChatService>,
    push: MockPushConnector,
    sink: Arc<RecordingSink>,
}

fn fast_settings() -> DriverSettings {
    DriverSettings {
        backoff: BackoffConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
            multiplier: 2,
            max_attempts: 5,
        },
        poll: PollSettings {
            interval: Duration::from_secs(1),
            check_status: true,
        },
    }
}

fn start(builder: MockServiceBuilder, push: MockPushConnector) -> Harness {
    let service = builder.build();
    let sink = Arc::new(RecordingSink::new());
    let core = SessionCore::new(CoreSettings::default());
    let (handle, join) = SessionDriver::spawn(
        core,
        service.clone(),
        Arc::new(push.clone()),
        sink.clone(),
        fast_settings(),
    );
    Harness {
        handle,
        join,
        service,
        push,
        sink,
    }
}

fn agent_msg(id: u64, body: &str) -> WireMessage {
    WireMessage::new(id, "Mitchell", body)
}

/// Drives the widget into AwaitingAgent with an open push channel
async fn hand_off(h: &Harness) {
    h.handle.send_text("I need a person").await.unwrap();
    wait_until("push channel to open", || h.push.is_connected()).await;
}

async fn hand_off_and_join(h: &Harness) {
    hand_off(h).await;
    assert!(h.push.push(PushEvent::AgentJoined { message: None }));
    wait_until("agent to join", || {
        h.sink.texts_from(MessageSource::System).iter().any(|t| t == AGENT_JOINED)
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_full_handoff_conversation() {
    let builder = MockServiceBuilder::new()
        .reply_text("Hi there")
        .reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());

    wait_until("greeting", || !h.sink.texts_from(MessageSource::Ai).is_empty()).await;

    h.handle.send_text("hello").await.unwrap();
    wait_until("AI reply", || {
        h.sink.texts_from(MessageSource::Ai).contains(&"Hi there".to_string())
    })
    .await;

    hand_off_and_join(&h).await;
    assert_eq!(h.push.sessions()[0].as_str(), "42");
    assert!(h
        .sink
        .indicators()
        .ends_with(&[ConnectionIndicator::WaitingForAgent, ConnectionIndicator::HumanAgent]));

    let requests = h.service.chat_requests();
    assert_eq!(requests[0].session_id, None);
    assert_eq!(requests[1].message, "I need a person");

    assert!(h.push.push(PushEvent::Message(agent_msg(1, "How can I help?"))));
    wait_until("agent message", || {
        h.sink.texts_from(MessageSource::Agent) == vec!["How can I help?".to_string()]
    })
    .await;

    assert!(h.push.push(PushEvent::SessionEnded {
        reason: Some("Agent ended chat".into()),
    }));
    wait_until("feedback prompt", || {
        h.sink.count(|e| *e == SinkEvent::ShowFeedbackPrompt) == 1
    })
    .await;
    wait_until("push channel to close", || !h.push.is_connected()).await;

    h.handle.rate(5, Some("great".into())).await.unwrap();
    wait_until("feedback submission", || {
        h.service.count(|c| matches!(c, ServiceCall::Feedback(_))) == 1
    })
    .await;
    let feedback = h
        .service
        .calls()
        .into_iter()
        .find_map(|c| match c {
            ServiceCall::Feedback(req) => Some(req),
            _ => None,
        })
        .unwrap();
    assert_eq!(feedback.rating, 5);
    assert_eq!(feedback.session_id.as_str(), "42");
    assert_eq!(feedback.comment, "great");

    let err = h.handle.rate(4, None).await.unwrap_err();
    assert!(matches!(
        err,
        WidgetError::Feedback(FeedbackError::AlreadySubmitted)
    ));

    let snap = h.handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::Ended);
    assert!(snap.feedback_submitted);
    assert!(!snap.input_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_exhaustion_falls_back_to_polling() {
    let push = MockPushConnector::new();
    push.refuse_all();
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, push);

    h.handle.send_text("I need a person").await.unwrap();
    wait_until("push exhaustion", || {
        h.sink
            .texts_from(MessageSource::System)
            .iter()
            .any(|t| t == PUSH_OFFLINE)
    })
    .await;

    // One initial attempt plus one per tolerated failure
    assert_eq!(h.push.connect_attempts(), 6);
    assert!(h.sink.indicators().contains(&ConnectionIndicator::Offline));

    h.service
        .push_poll(Ok(vec![agent_msg(3, "Are you still there?")]));
    wait_until("polled agent message", || {
        h.sink.texts_from(MessageSource::Agent) == vec!["Are you still there?".to_string()]
    })
    .await;

    let snap = h.handle.snapshot().await.unwrap();
    assert!(snap.degraded);
    assert_eq!(snap.last_seen_ordinal, Some(3));
    assert_eq!(snap.state, SessionState::AwaitingAgent);
}

#[tokio::test(start_paused = true)]
async fn test_push_drop_shows_reconnecting_then_recovers() {
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());
    hand_off(&h).await;

    h.push.drop_connection();
    wait_until("reconnect", || h.push.connect_attempts() == 2 && h.push.is_connected()).await;
    wait_until("indicator recovery", || {
        h.sink.indicators().ends_with(&[
            ConnectionIndicator::Reconnecting,
            ConnectionIndicator::WaitingForAgent,
        ])
    })
    .await;

    // Events on the new connection still flow
    assert!(h.push.push(PushEvent::AgentJoined { message: None }));
    wait_until("agent join after reconnect", || {
        h.sink.indicators().last() == Some(&ConnectionIndicator::HumanAgent)
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_push_frame_keeps_channel_open() {
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());
    hand_off_and_join(&h).await;

    assert!(h.push.push_result(Err(TransportError::MalformedPushPayload(
        "expected value at line 1 column 1".into()
    ))));
    assert!(h.push.push(PushEvent::Message(agent_msg(1, "Still here"))));
    wait_until("agent message after bad frame", || {
        h.sink.texts_from(MessageSource::Agent) == vec!["Still here".to_string()]
    })
    .await;

    assert_eq!(h.push.connect_attempts(), 1);
    assert!(h.push.is_connected());
    assert!(!h.sink.indicators().contains(&ConnectionIndicator::Reconnecting));
}

#[tokio::test(start_paused = true)]
async fn test_poll_detected_leave_ends_once() {
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());
    hand_off_and_join(&h).await;

    h.service
        .push_poll(Ok(vec![agent_msg(4, "Mitchell left the conversation")]));
    wait_until("session end", || {
        h.sink
            .texts_from(MessageSource::System)
            .contains(&"Mitchell left the conversation".to_string())
    })
    .await;
    wait_until("push channel to close", || !h.push.is_connected()).await;
    wait_until("feedback prompt", || {
        h.sink.count(|e| *e == SinkEvent::ShowFeedbackPrompt) == 1
    })
    .await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.sink.count(|e| *e == SinkEvent::SetInputEnabled(false)), 1);
    assert_eq!(h.sink.count(|e| *e == SinkEvent::ShowFeedbackPrompt), 1);

    // Polling stopped with the session
    let polls = h.service.count(|c| matches!(c, ServiceCall::Poll(_)));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.service.count(|c| matches!(c, ServiceCall::Poll(_))), polls);
}

#[tokio::test(start_paused = true)]
async fn test_end_session_notifies_service() {
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());
    hand_off_and_join(&h).await;

    h.handle.end_session().await.unwrap();
    wait_until("end notification", || {
        h.service.count(|c| matches!(c, ServiceCall::EndSession(_))) == 1
    })
    .await;
    assert!(h
        .sink
        .texts_from(MessageSource::System)
        .contains(&USER_ENDED.to_string()));
    wait_until("push channel to close", || !h.push.is_connected()).await;

    let snap = h.handle.snapshot().await.unwrap();
    assert_eq!(snap.state, SessionState::EndedByUser);
}

#[tokio::test(start_paused = true)]
async fn test_upload_and_rating_rejections_surface_to_caller() {
    let h = start(MockServiceBuilder::new(), MockPushConnector::new());

    let upload = FileUpload::new("photo.png", "image/png", vec![1, 2, 3]);
    let err = h.handle.attach_file(upload).await.unwrap_err();
    assert!(matches!(err, WidgetError::Upload(UploadRejected::NoSession)));

    let err = h.handle.rate(9, None).await.unwrap_err();
    assert!(matches!(
        err,
        WidgetError::Feedback(FeedbackError::InvalidRating(9))
    ));
    assert_eq!(h.service.calls().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upload_goes_to_current_session() {
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());
    hand_off_and_join(&h).await;

    let upload = FileUpload::new("receipt.pdf", "application/pdf", vec![0; 32]);
    h.handle.attach_file(upload).await.unwrap();
    wait_until("upload call", || {
        h.service.count(|c| {
            matches!(c, ServiceCall::Upload { session_id, file_name }
                if session_id.as_str() == "42" && file_name == "receipt.pdf")
        }) == 1
    })
    .await;
    assert!(h
        .sink
        .texts_from(MessageSource::Visitor)
        .contains(&"File: receipt.pdf".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_reply_from_before_reset_is_discarded() {
    let builder = MockServiceBuilder::new()
        .reply_text("too late")
        .with_delay(Duration::from_secs(3));
    let h = start(builder, MockPushConnector::new());

    h.handle.send_text("hello").await.unwrap();
    wait_until("chat turn sent", || h.service.chat_requests().len() == 1).await;
    h.handle.reset().await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!h
        .sink
        .texts_from(MessageSource::Ai)
        .contains(&"too late".to_string()));
    // Greeting rendered twice: once on start, once on reset
    assert_eq!(h.sink.texts_from(MessageSource::Ai).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_handle() {
    let h = start(MockServiceBuilder::new(), MockPushConnector::new());
    h.handle.shutdown().await.unwrap();
    h.join.await.unwrap();

    let err = h.handle.send_text("anyone?").await.unwrap_err();
    assert!(matches!(err, WidgetError::DriverClosed));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_driver() {
    let builder = MockServiceBuilder::new().reply_handoff("Connecting you to an agent", "42");
    let h = start(builder, MockPushConnector::new());
    hand_off(&h).await;

    let Harness {
        handle, join, push, ..
    } = h;
    drop(handle);
    join.await.unwrap();
    wait_until("push channel to close", || !push.is_connected()).await;
}
