//! Command implementations.

pub mod completions;
pub mod look;
pub mod merge_query;
pub mod user;
pub mod version;

use std::io::{self, Write};

use serde::Serialize;
use tracing::warn;

use crate::api::{ContentStore, HttpContentStore};
use crate::cli::Cli;
use crate::config::{load_config, resolve};
use crate::error::{Error, Result};
use crate::output::{ConsoleMessenger, Message, Messenger, Transcript};

/// Run `run` against a session on the configured instance.
///
/// The session is closed afterwards whether `run` succeeded or not; a failed
/// logout is only logged.
///
/// # Errors
///
/// Returns configuration and login errors, then whatever `run` returns.
pub fn with_session<T>(cli: &Cli, run: impl FnOnce(&dyn ContentStore) -> Result<T>) -> Result<T> {
    let settings = resolve(cli.overrides(), load_config(cli.config.as_deref())?)?;
    let store = HttpContentStore::connect(&settings)?;

    let result = run(&store);

    if let Err(e) = store.logout() {
        warn!(error = %e, "logout failed");
    }
    result
}

/// Stream for human-readable operator messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    /// Used when stdout carries the exported document.
    Stderr,
}

/// Operator messages of one command: printed as they happen, or collected
/// for the JSON result.
pub enum Output {
    Console(ConsoleMessenger<Box<dyn Write>>),
    Json(Transcript),
}

impl Output {
    /// With `quiet`, the console prints errors only.
    #[must_use]
    pub fn new(json: bool, quiet: bool, stream: Stream) -> Self {
        if json {
            return Self::Json(Transcript::new());
        }
        let writer: Box<dyn Write> = match stream {
            Stream::Stdout => Box::new(io::stdout()),
            Stream::Stderr => Box::new(io::stderr()),
        };
        Self::Console(ConsoleMessenger::new(writer).quiet(quiet))
    }

    #[must_use]
    pub fn messenger(&self) -> &dyn Messenger {
        match self {
            Self::Console(console) => console,
            Self::Json(transcript) => transcript,
        }
    }

    /// Collected messages; always empty for the console.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        match self {
            Self::Console(_) => Vec::new(),
            Self::Json(transcript) => transcript.messages(),
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Structured form of `err`, carrying the messages collected before it.
    #[must_use]
    pub fn failure_json(&self, err: &Error) -> serde_json::Value {
        let mut obj = err.to_structured_json();
        let messages = self.messages();
        if !messages.is_empty() {
            obj["messages"] = serde_json::json!(messages);
        }
        obj
    }
}

/// Print a single-line JSON result.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
