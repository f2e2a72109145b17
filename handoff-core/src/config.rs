// ABOUTME: Widget configuration parsed from TOML with environment variable overrides.
// ABOUTME: Every field has a default, so an absent file yields a usable local setup.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::backoff::BackoffConfig;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "handoff";
const APPLICATION: &str = "handoff";

/// Env var pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "HANDOFF_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// WebSocket base; derived from `server_url` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_visitor_name")]
    pub visitor_name: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default)]
    pub presentation: Presentation,
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_check_status")]
    pub check_status: bool,
    #[serde(default = "default_left_phrases")]
    pub left_phrases: Vec<String>,
}

/// How the binary renders sink events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    #[default]
    Terminal,
    Jsonl,
}

impl FromStr for Presentation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terminal" => Ok(Presentation::Terminal),
            "jsonl" | "json" => Ok(Presentation::Jsonl),
            other => anyhow::bail!("Unknown presentation '{}', expected terminal or jsonl", other),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_visitor_name() -> String {
    "Website Visitor".to_string()
}

fn default_greeting() -> String {
    "Hello! How can I help you today?".to_string()
}

fn default_feedback_delay_ms() -> u64 {
    2000
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_multiplier() -> u32 {
    2
}

fn default_max_attempts() -> u32 {
    5
}

fn default_keepalive_secs() -> u64 {
    25
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_check_status() -> bool {
    true
}

fn default_left_phrases() -> Vec<String> {
    crate::classifier::DEFAULT_LEFT_PHRASES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            push_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            visitor_name: default_visitor_name(),
            greeting: default_greeting(),
            presentation: Presentation::default(),
            feedback_delay_ms: default_feedback_delay_ms(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            check_status: default_check_status(),
            left_phrases: default_left_phrases(),
        }
    }
}

/// Default config file location, e.g. ~/.config/handoff/handoff.toml
pub fn config_file() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join("handoff.toml"))
}

impl Config {
    /// Load from the first config file found, then apply env overrides.
    ///
    /// Search order: `$HANDOFF_CONFIG_PATH`, `./handoff.toml`, XDG config dir.
    pub fn load() -> Result<Self> {
        let path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(explicit) => Some(PathBuf::from(explicit)),
            Err(_) => [Some(PathBuf::from("handoff.toml")), config_file()]
                .into_iter()
                .flatten()
                .find(|p| p.exists()),
        };
        Self::load_from(path.as_deref())
    }

    /// Load from `path` (defaults when `None`), then apply env overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                tracing::debug!(path = %path.display(), "Loaded config file");
                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("HANDOFF_SERVER_URL") {
            self.service.server_url = val;
        }
        if let Ok(val) = std::env::var("HANDOFF_PUSH_URL") {
            self.service.push_url = Some(val);
        }
        if let Ok(val) = std::env::var("HANDOFF_VISITOR_NAME") {
            self.widget.visitor_name = val;
        }
        if let Ok(val) = std::env::var("HANDOFF_POLL_INTERVAL_SECS") {
            self.poll.interval_secs = val.parse().with_context(|| {
                format!("HANDOFF_POLL_INTERVAL_SECS must be a number of seconds, got '{}'", val)
            })?;
        }
        if let Ok(val) = std::env::var("HANDOFF_PRESENTATION") {
            self.widget.presentation = val.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let server = self.service.server_url.trim();
        if server.is_empty() {
            anyhow::bail!("service.server_url is required");
        }
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            anyhow::bail!(
                "service.server_url must start with http:// or https://, got {}",
                server
            );
        }
        if let Some(push) = &self.service.push_url {
            if !(push.starts_with("ws://") || push.starts_with("wss://")) {
                anyhow::bail!("service.push_url must start with ws:// or wss://, got {}", push);
            }
        }
        if self.widget.visitor_name.trim().is_empty() {
            anyhow::bail!("widget.visitor_name must not be empty");
        }
        if self.service.request_timeout_secs == 0 {
            anyhow::bail!("service.request_timeout_secs must be greater than zero");
        }
        if self.poll.interval_secs == 0 {
            anyhow::bail!("poll.interval_secs must be greater than zero");
        }
        if self.push.keepalive_secs == 0 {
            anyhow::bail!("push.keepalive_secs must be greater than zero");
        }
        if self.push.initial_delay_ms == 0 {
            anyhow::bail!("push.initial_delay_ms must be greater than zero");
        }
        if self.push.multiplier < 1 {
            anyhow::bail!("push.multiplier must be at least 1");
        }
        if self.push.max_attempts == 0 {
            anyhow::bail!("push.max_attempts must be at least 1");
        }
        if self.push.max_delay_ms < self.push.initial_delay_ms {
            anyhow::bail!("push.max_delay_ms must not be below push.initial_delay_ms");
        }
        Ok(())
    }

    /// Push base URL: explicit, or the server URL with http(s) swapped for ws(s)
    pub fn push_url(&self) -> String {
        if let Some(push) = &self.service.push_url {
            return push.trim_end_matches('/').to_string();
        }
        let server = self.service.server_url.trim().trim_end_matches('/');
        if let Some(rest) = server.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = server.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            server.to_string()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.push.keepalive_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.widget.feedback_delay_ms)
    }

    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            initial_delay: Duration::from_millis(self.push.initial_delay_ms),
            max_delay: Duration::from_millis(self.push.max_delay_ms),
            multiplier: self.push.multiplier,
            max_attempts: self.push.max_attempts,
        }
    }
}
