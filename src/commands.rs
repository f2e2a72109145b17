// ABOUTME: Parses terminal input lines into widget actions.
// ABOUTME: Plain lines are chat turns; /commands drive handoff, end, rating, uploads and reset.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  /human                   ask for a human agent
  /attach <path> [caption] share a file with the agent
  /end                     end the conversation
  /rate <1-5> [comment]    rate the conversation
  /new                     start a new conversation
  /status                  show session state
  /quit                    exit
  /help                    show this help
Start a line with // to send a message beginning with /";

/// A slash command split into name and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lowercased, without the slash
    pub name: String,
    /// Whitespace-separated, quotes group words
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(|s| s.as_str())
    }

    /// Arguments from `index` on, joined with single spaces; `None` when there are none
    pub fn rest_from(&self, index: usize) -> Option<String> {
        let rest = self.args.get(index..)?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    Command(Command),
    Message(String),
    Ignore,
}

/// What the visitor asked for on one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Send(String),
    RequestHuman,
    Attach {
        path: PathBuf,
        caption: Option<String>,
    },
    End,
    Rate {
        score: u8,
        comment: Option<String>,
    },
    New,
    Status,
    Quit,
    Help,
}

fn parse_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => {
                quote = None;
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            (' ' | '\t', None) => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

/// Classify one line of input.
///
/// `//` escapes a leading slash; a lone `/` or a slash followed by a
/// non-letter (like a path) is sent as text.
pub fn parse_line(line: &str) -> ParseResult {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParseResult::Ignore;
    }

    if let Some(escaped) = trimmed.strip_prefix("//") {
        let escaped = escaped.trim();
        if escaped.is_empty() {
            return ParseResult::Ignore;
        }
        return ParseResult::Message(format!("/{}", escaped));
    }

    if let Some(after_slash) = trimmed.strip_prefix('/') {
        if after_slash.chars().next().is_some_and(|c| c.is_alphabetic()) {
            let mut parts = after_slash.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default().to_lowercase();
            let args = parts.next().map(parse_args).unwrap_or_default();
            return ParseResult::Command(Command::new(name, args));
        }
    }

    ParseResult::Message(trimmed.to_string())
}

impl Action {
    pub fn from_command(command: &Command) -> Result<Self> {
        let action = match command.name.as_str() {
            "human" | "agent" => Action::RequestHuman,
            "end" => Action::End,
            "new" | "reset" => Action::New,
            "status" => Action::Status,
            "quit" | "exit" => Action::Quit,
            "help" => Action::Help,
            "rate" => {
                let Some(score) = command.arg(0) else {
                    bail!("Usage: /rate <1-5> [comment]");
                };
                let score = score
                    .parse::<u8>()
                    .with_context(|| format!("Rating must be a number from 1 to 5, got '{}'", score))?;
                Action::Rate {
                    score,
                    comment: command.rest_from(1),
                }
            }
            "attach" => {
                let Some(path) = command.arg(0) else {
                    bail!("Usage: /attach <path> [caption]");
                };
                Action::Attach {
                    path: PathBuf::from(path),
                    caption: command.rest_from(1),
                }
            }
            other => bail!("Unknown command '/{}'. Type /help for a list.", other),
        };
        Ok(action)
    }
}

/// Turn a line into an action; `Ok(None)` for blank lines
pub fn interpret(line: &str) -> Result<Option<Action>> {
    match parse_line(line) {
        ParseResult::Ignore => Ok(None),
        ParseResult::Message(text) => Ok(Some(Action::Send(text))),
        ParseResult::Command(command) => Action::from_command(&command).map(Some),
    }
}
