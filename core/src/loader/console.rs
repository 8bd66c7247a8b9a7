//! Console sinks
//!
//! Every `console.*` call in a unit becomes an `OutputLine` tagged with the
//! module that printed it. Where the lines go is up to the embedder.

use crate::executor::ConsoleLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputLine {
    pub level: ConsoleLevel,
    /// Path of the module that printed the line
    pub module: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl OutputLine {
    pub fn new(level: ConsoleLevel, module: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            module: module.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// `[LOG] text` / `[ERR] text`
    pub fn render(&self) -> String {
        format!("{} {}", self.level.prefix(), self.text)
    }
}

pub trait Console: Send {
    fn write(&mut self, line: OutputLine);
}

/// Writes `[LOG]` lines to stdout and `[ERR]` lines to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioConsole;

impl Console for StdioConsole {
    fn write(&mut self, line: OutputLine) {
        if line.level.is_error() {
            eprintln!("{}", line.render());
        } else {
            println!("{}", line.render());
        }
    }
}

/// Collects lines in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    lines: Arc<Mutex<Vec<OutputLine>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Rendered text of every line so far
    pub fn rendered(&self) -> Vec<String> {
        self.lines().iter().map(OutputLine::render).collect()
    }
}

impl Console for SharedBuffer {
    fn write(&mut self, line: OutputLine) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

/// Forwards lines to an async consumer
#[derive(Debug, Clone)]
pub struct ChannelConsole {
    tx: UnboundedSender<OutputLine>,
}

impl ChannelConsole {
    pub fn new(tx: UnboundedSender<OutputLine>) -> Self {
        Self { tx }
    }
}

impl Console for ChannelConsole {
    fn write(&mut self, line: OutputLine) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(line);
    }
}
