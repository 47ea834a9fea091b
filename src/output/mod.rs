//! Operator-facing messages and file output.
//!
//! Reconciliation reports warnings (slug claimed elsewhere), errors (remote
//! failures) and confirmations through a [`Messenger`] handed to it by the
//! caller. The console sink prints colored lines to a stream of the caller's
//! choosing; the transcript sink records them for `--json` output and tests.

mod file;

pub use file::{
    atomic_write, look_file_name, read_json_object, sanitize_file_name, user_file_name, write_json,
};

use std::cell::RefCell;
use std::io::Write;

use colored::Colorize;
use serde::Serialize;

/// Sink for operator-facing messages.
pub trait Messenger {
    /// Something unexpected that does not stop the operation.
    fn warn(&self, message: &str);

    /// A failure, reported before the error is returned.
    fn error(&self, message: &str);

    /// A confirmation of what was done.
    fn ok(&self, message: &str);
}

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Warning,
    Error,
    Ok,
}

/// A recorded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

/// Prints messages as colored lines.
pub struct ConsoleMessenger<W: Write> {
    writer: RefCell<W>,
    quiet: bool,
}

impl<W: Write> ConsoleMessenger<W> {
    /// Messenger writing to any stream.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
            quiet: false,
        }
    }

    /// Print errors only; warnings and confirmations are dropped.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Recover the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn line(&self, text: impl std::fmt::Display) {
        // Best effort: a closed pipe is not an import failure.
        let _ = writeln!(self.writer.borrow_mut(), "{text}");
    }
}

impl<W: Write> Messenger for ConsoleMessenger<W> {
    fn warn(&self, message: &str) {
        if !self.quiet {
            self.line(message.yellow());
        }
    }

    fn error(&self, message: &str) {
        self.line(message.red());
    }

    fn ok(&self, message: &str) {
        if !self.quiet {
            self.line(message.green());
        }
    }
}

/// Records messages instead of printing them.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: RefCell<Vec<Message>>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    /// Texts of the messages at one level.
    #[must_use]
    pub fn texts(&self, level: Level) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|m| m.level == level)
            .map(|m| m.text.clone())
            .collect()
    }

    fn push(&self, level: Level, text: &str) {
        self.messages.borrow_mut().push(Message {
            level,
            text: text.to_string(),
        });
    }
}

impl Messenger for Transcript {
    fn warn(&self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn ok(&self, message: &str) {
        self.push(Level::Ok, message);
    }
}
