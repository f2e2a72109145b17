// ABOUTME: Machine-readable sink that writes every SinkEvent as one JSON object per line.
// ABOUTME: Lets another process drive a real widget UI from the session core's output.

use anyhow::Result;
use async_trait::async_trait;
use handoff_core::{Activity, ConnectionIndicator, Message, PresentationSink, SinkEvent};
use std::io::Write;
use std::sync::Mutex;

pub struct JsonlSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self, event: &SinkEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> PresentationSink for JsonlSink<W> {
    async fn append_message(&self, message: &Message) -> Result<()> {
        self.write(&SinkEvent::AppendMessage(message.clone()))
    }

    async fn set_input_enabled(&self, enabled: bool) -> Result<()> {
        self.write(&SinkEvent::SetInputEnabled(enabled))
    }

    async fn set_request_human_enabled(&self, enabled: bool) -> Result<()> {
        self.write(&SinkEvent::SetRequestHumanEnabled(enabled))
    }

    async fn set_connection_indicator(&self, indicator: ConnectionIndicator) -> Result<()> {
        self.write(&SinkEvent::SetConnectionIndicator(indicator))
    }

    async fn set_activity(&self, activity: Activity) -> Result<()> {
        self.write(&SinkEvent::SetActivity(activity))
    }

    async fn show_feedback_prompt(&self) -> Result<()> {
        self.write(&SinkEvent::ShowFeedbackPrompt)
    }

    async fn set_rating_enabled(&self, enabled: bool) -> Result<()> {
        self.write(&SinkEvent::SetRatingEnabled(enabled))
    }
}
