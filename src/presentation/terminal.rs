// ABOUTME: Human-readable sink: one line per message plus short status notices.
// ABOUTME: Downloads are resolved against the server URL so agent attachments are clickable.

use anyhow::Result;
use async_trait::async_trait;
use handoff_core::{Activity, ConnectionIndicator, Message, MessageSource, PresentationSink};
use std::io::Write;
use std::sync::Mutex;

fn indicator_label(indicator: ConnectionIndicator) -> &'static str {
    match indicator {
        ConnectionIndicator::AiAssistant => "AI Assistant",
        ConnectionIndicator::WaitingForAgent => "Waiting for an agent",
        ConnectionIndicator::HumanAgent => "Human Agent",
        ConnectionIndicator::Reconnecting => "Reconnecting...",
        ConnectionIndicator::Offline => "Offline (checking every few seconds)",
        ConnectionIndicator::Ended => "Conversation ended",
    }
}

/// Format a message the way the terminal shows it
pub fn render_message(message: &Message) -> String {
    let time = message.sent_at().format("%H:%M");
    let text = message.display_text();
    match message.source() {
        MessageSource::System => format!("[{}] * {}", time, text),
        _ => format!("[{}] {}: {}", time, message.author(), text),
    }
}

pub struct TerminalSink<W: Write + Send> {
    out: Mutex<W>,
    /// Prefixed to server-relative download links
    download_base: Option<String>,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            download_base: None,
        }
    }

    pub fn with_download_base(mut self, base: &str) -> Self {
        self.download_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    fn download_link(&self, download: &str) -> String {
        match &self.download_base {
            Some(base) if download.starts_with('/') => format!("{}{}", base, download),
            _ => download.to_string(),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, text: &str) -> Result<()> {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(out, "{}", text)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> PresentationSink for TerminalSink<W> {
    async fn append_message(&self, message: &Message) -> Result<()> {
        self.line(&render_message(message))?;
        for attachment in message.attachments() {
            if let Some(download) = &attachment.download {
                let link = self.download_link(download);
                self.line(&format!("        {} -> {}", attachment.name, link))?;
            }
        }
        Ok(())
    }

    async fn set_input_enabled(&self, enabled: bool) -> Result<()> {
        if !enabled {
            self.line("-- input closed; /new starts a new conversation --")?;
        }
        Ok(())
    }

    async fn set_connection_indicator(&self, indicator: ConnectionIndicator) -> Result<()> {
        self.line(&format!("-- {} --", indicator_label(indicator)))
    }

    async fn set_activity(&self, activity: Activity) -> Result<()> {
        match activity {
            Activity::Typing => self.line("   (typing...)"),
            Activity::Uploading => self.line("   (uploading...)"),
            Activity::Idle => Ok(()),
        }
    }

    async fn show_feedback_prompt(&self) -> Result<()> {
        self.line("How was your conversation? Rate it with /rate <1-5> [comment]")
    }
}
