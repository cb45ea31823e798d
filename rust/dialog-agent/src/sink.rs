//! Output sink: where messages meant for the user end up.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Displays `(tag, message)` pairs to the user.
pub trait OutputSink: Send {
    fn output(&mut self, tag: &str, message: &str);
}

/// Render a tagged message the way every sink displays it.
pub fn format_output(tag: &str, message: &str) -> String {
    format!("{tag}: {message}")
}

/// Writes to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn output(&mut self, tag: &str, message: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(error) = writeln!(stdout, "{}", format_output(tag, message)) {
            tracing::warn!(%error, "could not write to stdout");
        }
    }
}

/// Collects formatted lines in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl OutputSink for RecordingSink {
    fn output(&mut self, tag: &str, message: &str) {
        self.lines.lock().push(format_output(tag, message));
    }
}
