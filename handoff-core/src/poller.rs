// ABOUTME: Polling fallback that fetches session messages and status on a fixed interval.
// ABOUTME: Errors are logged and skipped; the session core decides what the results mean.

use handoff_transport::{ChatService, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::cancel::CancelSignal;
use crate::config::Config;
use crate::driver::Input;
use crate::session::PollReport;
use crate::supervisor::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Also ask `/session/{id}/status` on every tick
    pub check_status: bool,
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            check_status: config.poll.check_status,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

async fn poll_once(
    service: &dyn ChatService,
    session_id: &SessionId,
    check_status: bool,
) -> PollReport {
    let messages = match service.poll_messages(session_id).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::debug!(session_id = %session_id, error = %e, "Poll failed");
            Vec::new()
        }
    };

    let active = if check_status {
        match service.session_status(session_id).await {
            Ok(active) => Some(active),
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Status check failed");
                None
            }
        }
    } else {
        None
    };

    PollReport { messages, active }
}

/// Tick every `settings.interval` until cancelled or the driver stops
pub async fn run_poller(
    service: Arc<dyn ChatService>,
    session_id: SessionId,
    settings: PollSettings,
    inputs: mpsc::WeakSender<Input>,
    mut cancel: CancelSignal,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick is immediate; the push channel gets a head start
    ticker.tick().await;

    loop {
        let findings = tokio::select! {
            _ = cancel.cancelled() => return,
            report = async {
                ticker.tick().await;
                poll_once(service.as_ref(), &session_id, settings.check_status).await
            } => report,
        };

        tracing::trace!(
            session_id = %session_id,
            messages = findings.messages.len(),
            active = ?findings.active,
            "Poll tick"
        );
        let input = Input::PollCompleted {
            session_id: session_id.clone(),
            report: findings,
        };
        if !report(&inputs, input).await {
            return;
        }
    }
}
