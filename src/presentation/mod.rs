// ABOUTME: Presentation sinks for the terminal front end.
// ABOUTME: Terminal renders human-readable lines; jsonl emits one serialized SinkEvent per line.

pub mod jsonl;
pub mod terminal;

use handoff_core::{Presentation, PresentationSink};
use std::sync::Arc;

pub use jsonl::JsonlSink;
pub use terminal::TerminalSink;

/// Sink writing to stdout in the configured style
pub fn stdout_sink(presentation: Presentation, server_url: &str) -> Arc<dyn PresentationSink> {
    match presentation {
        Presentation::Terminal => {
            Arc::new(TerminalSink::new(std::io::stdout()).with_download_base(server_url))
        }
        Presentation::Jsonl => Arc::new(JsonlSink::new(std::io::stdout())),
    }
}
