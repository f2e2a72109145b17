// ABOUTME: Shared helpers for handoff-core integration tests.
// ABOUTME: RecordingSink captures every sink call as a SinkEvent for later assertions.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use handoff_core::{
    Activity, ConnectionIndicator, Message, MessageSource, PresentationSink, SinkEvent,
};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::AppendMessage(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Display text of every appended message from `source`
    pub fn texts_from(&self, source: MessageSource) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.source() == source)
            .map(|m| m.display_text())
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn indicators(&self) -> Vec<ConnectionIndicator> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::SetConnectionIndicator(i) => Some(i),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PresentationSink for RecordingSink {
    async fn append_message(&self, message: &Message) -> Result<()> {
        self.record(SinkEvent::AppendMessage(message.clone()));
        Ok(())
    }

    async fn set_input_enabled(&self, enabled: bool) -> Result<()> {
        self.record(SinkEvent::SetInputEnabled(enabled));
        Ok(())
    }

    async fn set_request_human_enabled(&self, enabled: bool) -> Result<()> {
        self.record(SinkEvent::SetRequestHumanEnabled(enabled));
        Ok(())
    }

    async fn set_connection_indicator(&self, indicator: ConnectionIndicator) -> Result<()> {
        self.record(SinkEvent::SetConnectionIndicator(indicator));
        Ok(())
    }

    async fn set_activity(&self, activity: Activity) -> Result<()> {
        self.record(SinkEvent::SetActivity(activity));
        Ok(())
    }

    async fn show_feedback_prompt(&self) -> Result<()> {
        self.record(SinkEvent::ShowFeedbackPrompt);
        Ok(())
    }

    async fn set_rating_enabled(&self, enabled: bool) -> Result<()> {
        self.record(SinkEvent::SetRatingEnabled(enabled));
        Ok(())
    }
}

/// Poll `condition` while letting (paused) time advance in small steps
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
