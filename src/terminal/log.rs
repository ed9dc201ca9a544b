//! Terminal decorator that mirrors the transcript into a second writer.

use std::fmt;
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use super::Terminal;

/// Writes transcript lines to a second writer in addition to the terminal.
///
/// Status updates are passed through but never mirrored. Write failures on
/// the mirror are logged and otherwise ignored, so a full disk never stops
/// the report.
pub struct LogTerminal<T, W> {
    inner: T,
    sink: Mutex<W>,
}

impl<T: Terminal, W: Write + Send> LogTerminal<T, W> {
    /// Wrap `inner`, mirroring its transcript into `sink`.
    pub fn new(inner: T, sink: W) -> Self {
        Self {
            inner,
            sink: Mutex::new(sink),
        }
    }

    /// The wrapped terminal.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consume the decorator, returning the terminal and the sink.
    pub fn into_parts(self) -> (T, W) {
        let sink = self
            .sink
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (self.inner, sink)
    }

    fn mirror(&self, line: &str) {
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = sink.write_all(line.as_bytes()) {
            tracing::warn!(error = %e, "failed to write transcript to log");
        }
    }
}

impl<T: Terminal, W: Write + Send> Terminal for LogTerminal<T, W> {
    fn print(&self, line: &str) {
        let mut line = line.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        self.inner.print(&line);
        self.mirror(&line);
    }

    fn print_fmt(&self, args: fmt::Arguments<'_>) {
        self.print(&args.to_string());
    }

    fn set_status(&self, lines: Vec<String>) {
        self.inner.set_status(lines);
    }

    fn run(&self, stop: &AtomicBool) {
        self.inner.run(stop);
    }
}
