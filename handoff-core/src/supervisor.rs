// ABOUTME: Keeps the push channel open for one session with bounded exponential reconnection.
// ABOUTME: Forwards push events to the driver and reports connect, drop and exhaustion.

use handoff_transport::{PushConnector, PushEvent, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use crate::backoff::{BackoffConfig, BackoffState};
use crate::cancel::CancelSignal;
use crate::driver::Input;

/// Send to the driver; false once the driver is gone
pub(crate) async fn report(inputs: &mpsc::WeakSender<Input>, input: Input) -> bool {
    match inputs.upgrade() {
        Some(tx) => tx.send(input).await.is_ok(),
        None => false,
    }
}

/// Run until cancelled, the driver stops, or reconnection is exhausted
pub async fn run_push_supervisor(
    connector: Arc<dyn PushConnector>,
    session_id: SessionId,
    backoff: BackoffConfig,
    inputs: mpsc::WeakSender<Input>,
    mut cancel: CancelSignal,
) {
    let mut backoff = BackoffState::new(backoff);

    loop {
        let attempt = tokio::select! {
            _ = cancel.cancelled() => return,
            attempt = connector.connect(&session_id) => attempt,
        };

        match attempt {
            Ok(mut stream) => {
                backoff.record_success();
                tracing::info!(session_id = %session_id, "Push channel open");
                if !report(&inputs, Input::PushConnected(session_id.clone())).await {
                    return;
                }

                loop {
                    let item = tokio::select! {
                        _ = cancel.cancelled() => return,
                        item = stream.next() => item,
                    };
                    match item {
                        Some(Ok(PushEvent::Pong)) => {
                            tracing::trace!(session_id = %session_id, "Keepalive acknowledged");
                        }
                        Some(Ok(event)) => {
                            let input = Input::Push {
                                session_id: session_id.clone(),
                                event,
                            };
                            if !report(&inputs, input).await {
                                return;
                            }
                        }
                        Some(Err(e)) if e.is_malformed_payload() => {
                            tracing::warn!(session_id = %session_id, error = %e, "Dropping malformed push frame");
                        }
                        Some(Err(e)) => {
                            tracing::warn!(session_id = %session_id, error = %e, "Push channel failed");
                            break;
                        }
                        None => {
                            tracing::info!(session_id = %session_id, "Push channel closed");
                            break;
                        }
                    }
                }

                if !report(&inputs, Input::PushDropped(session_id.clone())).await {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    attempt = backoff.failures() + 1,
                    error = %e,
                    "Push connect failed"
                );
            }
        }

        match backoff.record_failure() {
            Some(delay) => {
                tracing::debug!(
                    session_id = %session_id,
                    attempt = backoff.failures(),
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting push channel"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => {
                tracing::warn!(session_id = %session_id, "Push reconnection exhausted");
                report(&inputs, Input::PushExhausted(session_id.clone())).await;
                return;
            }
        }
    }
}
