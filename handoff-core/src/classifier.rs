// ABOUTME: Detects lifecycle signals embedded in agent message text.
// ABOUTME: The phrase matcher is a default; any LifecycleClassifier can be plugged into the core.

use regex::{Regex, RegexBuilder};

/// Phrases the service posts when an agent leaves the conversation
pub const DEFAULT_LEFT_PHRASES: &[&str] = &[
    "left the conversation",
    "left the channel",
    "has left",
    "left the chat",
];

/// Lifecycle meaning of a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Ordinary conversation content
    None,
    /// The agent left; the session is over
    AgentLeft,
}

pub trait LifecycleClassifier: Send + Sync {
    fn classify(&self, body: &str) -> LifecycleSignal;
}

/// Case-insensitive substring matcher over a phrase list
#[derive(Debug, Clone)]
pub struct PhraseClassifier {
    pattern: Option<Regex>,
}

impl PhraseClassifier {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = phrases
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }
}

impl Default for PhraseClassifier {
    fn default() -> Self {
        // Escaped literals always compile
        Self::new(DEFAULT_LEFT_PHRASES).unwrap_or(Self { pattern: None })
    }
}

impl LifecycleClassifier for PhraseClassifier {
    fn classify(&self, body: &str) -> LifecycleSignal {
        match &self.pattern {
            Some(re) if re.is_match(body) => LifecycleSignal::AgentLeft,
            _ => LifecycleSignal::None,
        }
    }
}
