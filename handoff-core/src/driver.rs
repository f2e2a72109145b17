// ABOUTME: Single-actor driver that owns the SessionCore and performs its effects.
// ABOUTME: WidgetHandle is the cloneable, Send + Sync way to feed user intents into it.

use handoff_transport::{
    ChatService, ChatTurnResponse, FileUpload, PushConnector, PushEvent, SessionId, TransportError,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::backoff::BackoffConfig;
use crate::cancel::{cancel_pair, CancelToken};
use crate::config::Config;
use crate::feedback::FeedbackError;
use crate::poller::{run_poller, PollSettings};
use crate::session::{Effect, Outcome, PollReport, RequestId, SessionCore, Snapshot};
use crate::sink::PresentationSink;
use crate::supervisor::{report, run_push_supervisor};
use crate::upload::UploadRejected;

const INPUT_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("session driver has stopped")]
    DriverClosed,
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error(transparent)]
    Upload(#[from] UploadRejected),
}

/// What the visitor asked for
#[derive(Debug)]
pub enum Intent {
    SendText(String),
    RequestHuman,
    AttachFile {
        upload: FileUpload,
        reply: oneshot::Sender<Result<(), UploadRejected>>,
    },
    EndSession,
    Rate {
        score: u8,
        comment: Option<String>,
        reply: oneshot::Sender<Result<(), FeedbackError>>,
    },
    Reset,
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Everything the driver reacts to, applied strictly one at a time
#[derive(Debug)]
pub enum Input {
    Intent(Intent),
    ChatTurnCompleted {
        request_id: RequestId,
        result: Result<ChatTurnResponse, TransportError>,
    },
    UploadCompleted {
        request_id: RequestId,
        result: Result<(), TransportError>,
    },
    Push {
        session_id: SessionId,
        event: PushEvent,
    },
    PushConnected(SessionId),
    PushDropped(SessionId),
    PushExhausted(SessionId),
    PollCompleted {
        session_id: SessionId,
        report: PollReport,
    },
    FeedbackPromptDue {
        generation: u64,
    },
}

/// Background task tunables
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub backoff: BackoffConfig,
    pub poll: PollSettings,
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backoff: config.backoff(),
            poll: PollSettings::from_config(config),
        }
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Cloneable handle used by the input side of the widget
#[derive(Clone)]
pub struct WidgetHandle {
    tx: mpsc::Sender<Input>,
}

impl WidgetHandle {
    async fn send(&self, intent: Intent) -> Result<(), WidgetError> {
        self.tx
            .send(Input::Intent(intent))
            .await
            .map_err(|_| WidgetError::DriverClosed)
    }

    pub async fn send_text(&self, text: &str) -> Result<(), WidgetError> {
        self.send(Intent::SendText(text.to_string())).await
    }

    pub async fn request_human(&self) -> Result<(), WidgetError> {
        self.send(Intent::RequestHuman).await
    }

    /// Resolves once the file is accepted locally; the upload itself runs in the background
    pub async fn attach_file(&self, upload: FileUpload) -> Result<(), WidgetError> {
        let (reply, rx) = oneshot::channel();
        self.send(Intent::AttachFile { upload, reply }).await?;
        rx.await.map_err(|_| WidgetError::DriverClosed)??;
        Ok(())
    }

    pub async fn end_session(&self) -> Result<(), WidgetError> {
        self.send(Intent::EndSession).await
    }

    pub async fn rate(&self, score: u8, comment: Option<String>) -> Result<(), WidgetError> {
        let (reply, rx) = oneshot::channel();
        self.send(Intent::Rate {
            score,
            comment,
            reply,
        })
        .await?;
        rx.await.map_err(|_| WidgetError::DriverClosed)??;
        Ok(())
    }

    pub async fn reset(&self) -> Result<(), WidgetError> {
        self.send(Intent::Reset).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, WidgetError> {
        let (reply, rx) = oneshot::channel();
        self.send(Intent::Snapshot(reply)).await?;
        rx.await.map_err(|_| WidgetError::DriverClosed)
    }

    pub async fn shutdown(&self) -> Result<(), WidgetError> {
        self.send(Intent::Shutdown).await
    }
}

pub struct SessionDriver {
    core: SessionCore,
    service: Arc<dyn ChatService>,
    push: Arc<dyn PushConnector>,
    sink: Arc<dyn PresentationSink>,
    settings: DriverSettings,
    inputs: mpsc::Receiver<Input>,
    /// Given to spawned tasks so they never keep the driver alive
    loopback: mpsc::WeakSender<Input>,
    push_task: Option<CancelToken>,
    poll_task: Option<CancelToken>,
}

impl SessionDriver {
    pub fn new(
        core: SessionCore,
        service: Arc<dyn ChatService>,
        push: Arc<dyn PushConnector>,
        sink: Arc<dyn PresentationSink>,
        settings: DriverSettings,
    ) -> (Self, WidgetHandle) {
        let (tx, inputs) = mpsc::channel(INPUT_BUFFER);
        let driver = Self {
            core,
            service,
            push,
            sink,
            settings,
            inputs,
            loopback: tx.downgrade(),
            push_task: None,
            poll_task: None,
        };
        (driver, WidgetHandle { tx })
    }

    /// Build and spawn a driver on the current runtime
    pub fn spawn(
        core: SessionCore,
        service: Arc<dyn ChatService>,
        push: Arc<dyn PushConnector>,
        sink: Arc<dyn PresentationSink>,
        settings: DriverSettings,
    ) -> (WidgetHandle, JoinHandle<()>) {
        let (driver, handle) = Self::new(core, service, push, sink, settings);
        (handle, tokio::spawn(driver.run()))
    }

    /// Process inputs until shutdown or every handle is dropped
    pub async fn run(mut self) {
        tracing::debug!("Session driver started");
        let greeting = self.core.start();
        self.apply(greeting).await;

        while let Some(input) = self.inputs.recv().await {
            if matches!(input, Input::Intent(Intent::Shutdown)) {
                break;
            }
            let outcome = self.handle(input);
            self.apply(outcome).await;
        }

        self.stop_push();
        self.stop_polling();
        tracing::debug!("Session driver stopped");
    }

    fn handle(&mut self, input: Input) -> Outcome {
        match input {
            Input::Intent(intent) => self.handle_intent(intent),
            Input::ChatTurnCompleted { request_id, result } => {
                self.core.chat_turn_completed(request_id, result)
            }
            Input::UploadCompleted { request_id, result } => {
                self.core.upload_completed(request_id, result)
            }
            Input::Push { session_id, event } => self.core.push_event(&session_id, event),
            Input::PushConnected(session_id) => self.core.push_connected(&session_id),
            Input::PushDropped(session_id) => self.core.push_dropped(&session_id),
            Input::PushExhausted(session_id) => {
                // A supervisor from an earlier session must not cancel the current one
                if self.core.session_id() == Some(&session_id) {
                    self.push_task = None;
                }
                self.core.push_exhausted(&session_id)
            }
            Input::PollCompleted { session_id, report } => {
                self.core.poll_completed(&session_id, report)
            }
            Input::FeedbackPromptDue { generation } => self.core.feedback_prompt_due(generation),
        }
    }

    fn handle_intent(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::SendText(text) => self.core.send_text(&text),
            Intent::RequestHuman => self.core.request_human(),
            Intent::AttachFile { upload, reply } => match self.core.attach_file(upload) {
                Ok(outcome) => {
                    let _ = reply.send(Ok(()));
                    outcome
                }
                Err(rejected) => {
                    tracing::info!(reason = %rejected, "Upload rejected");
                    let _ = reply.send(Err(rejected));
                    Outcome::default()
                }
            },
            Intent::EndSession => self.core.end_by_user(),
            Intent::Rate {
                score,
                comment,
                reply,
            } => match self.core.rate(score, comment) {
                Ok(outcome) => {
                    let _ = reply.send(Ok(()));
                    outcome
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    Outcome::default()
                }
            },
            Intent::Reset => self.core.reset(),
            Intent::Snapshot(reply) => {
                let _ = reply.send(self.core.snapshot());
                Outcome::default()
            }
            // Handled in run()
            Intent::Shutdown => Outcome::default(),
        }
    }

    async fn apply(&mut self, outcome: Outcome) {
        for event in &outcome.events {
            if let Err(e) = event.deliver(self.sink.as_ref()).await {
                tracing::warn!(error = %e, "Presentation sink failed");
            }
        }
        for effect in outcome.effects {
            self.perform(effect);
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::SendChatTurn {
                request_id,
                request,
            } => {
                let service = self.service.clone();
                let loopback = self.loopback.clone();
                tokio::spawn(async move {
                    let result = service.send_chat_turn(&request).await;
                    report(&loopback, Input::ChatTurnCompleted { request_id, result }).await;
                });
            }
            Effect::UploadFile {
                request_id,
                session_id,
                upload,
            } => {
                let service = self.service.clone();
                let loopback = self.loopback.clone();
                tokio::spawn(async move {
                    let result = service.upload_file(&session_id, &upload).await;
                    report(&loopback, Input::UploadCompleted { request_id, result }).await;
                });
            }
            Effect::OpenPush(session_id) => {
                let (token, signal) = cancel_pair();
                self.push_task = Some(token);
                tokio::spawn(run_push_supervisor(
                    self.push.clone(),
                    session_id,
                    self.settings.backoff.clone(),
                    self.loopback.clone(),
                    signal,
                ));
            }
            Effect::ClosePush => self.stop_push(),
            Effect::StartPolling(session_id) => {
                let (token, signal) = cancel_pair();
                self.poll_task = Some(token);
                tokio::spawn(run_poller(
                    self.service.clone(),
                    session_id,
                    self.settings.poll,
                    self.loopback.clone(),
                    signal,
                ));
            }
            Effect::StopPolling => self.stop_polling(),
            Effect::ScheduleFeedbackPrompt { delay, generation } => {
                let loopback = self.loopback.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    report(&loopback, Input::FeedbackPromptDue { generation }).await;
                });
            }
            Effect::NotifySessionEnd(session_id) => {
                let service = self.service.clone();
                tokio::spawn(async move {
                    if let Err(e) = service.end_session(&session_id).await {
                        tracing::warn!(session_id = %session_id, error = %e, "Failed to notify session end");
                    }
                });
            }
            Effect::SubmitFeedback(request) => {
                let service = self.service.clone();
                tokio::spawn(async move {
                    if let Err(e) = service.submit_feedback(&request).await {
                        tracing::warn!(session_id = %request.session_id, error = %e, "Failed to submit feedback");
                    }
                });
            }
        }
    }

    fn stop_push(&mut self) {
        // Dropping the token cancels the supervisor
        self.push_task = None;
    }

    fn stop_polling(&mut self) {
        self.poll_task = None;
    }
}
