// ABOUTME: Applies parsed terminal actions to a running widget session.
// ABOUTME: Local rejections come back as notices for the user instead of failing the loop.

use anyhow::Result;
use handoff_core::{Snapshot, WidgetError, WidgetHandle};

use crate::commands::{Action, HELP};
use crate::uploads::load_upload;

/// What the input loop should do after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Quiet,
    Notice(String),
    Quit,
}

fn describe(snapshot: &Snapshot) -> String {
    let mut status = format!("Status: {}", snapshot.state);
    if let Some(session_id) = &snapshot.session_id {
        status.push_str(&format!(" (session {})", session_id));
    }
    if snapshot.degraded {
        status.push_str(", live updates unavailable");
    }
    if let Some(ordinal) = snapshot.last_seen_ordinal {
        status.push_str(&format!(", last message #{}", ordinal));
    }
    if snapshot.feedback_submitted {
        status.push_str(", feedback sent");
    }
    status
}

fn rejected(err: WidgetError) -> Result<Reply> {
    match err {
        WidgetError::DriverClosed => Err(err.into()),
        other => Ok(Reply::Notice(other.to_string())),
    }
}

pub async fn dispatch(handle: &WidgetHandle, action: Action) -> Result<Reply> {
    let outcome = match action {
        Action::Send(text) => handle.send_text(&text).await,
        Action::RequestHuman => handle.request_human().await,
        Action::End => handle.end_session().await,
        Action::New => handle.reset().await,
        Action::Rate { score, comment } => handle.rate(score, comment).await,
        Action::Attach { path, caption } => {
            let upload = match load_upload(&path, caption).await {
                Ok(upload) => upload,
                Err(e) => return Ok(Reply::Notice(format!("{:#}", e))),
            };
            handle.attach_file(upload).await
        }
        Action::Status => {
            return match handle.snapshot().await {
                Ok(snapshot) => Ok(Reply::Notice(describe(&snapshot))),
                Err(e) => rejected(e),
            };
        }
        Action::Help => return Ok(Reply::Notice(HELP.to_string())),
        Action::Quit => return Ok(Reply::Quit),
    };

    match outcome {
        Ok(()) => Ok(Reply::Quiet),
        Err(e) => rejected(e),
    }
}
