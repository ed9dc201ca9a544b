//! Default terminal: transcript lines scroll above a redrawn status region.

use std::io::{self, IsTerminal, Stdout, Write};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveToPreviousLine, Show},
    queue,
    terminal::{self, Clear, ClearType},
};

use unicode_width::UnicodeWidthChar;

use super::Terminal;
use crate::config::DEFAULT_REFRESH_MS;

/// Width assumed when the terminal size can't be queried.
const FALLBACK_WIDTH: usize = 80;

/// Lines waiting to be drawn by the render loop.
#[derive(Debug, Default)]
struct Pending {
    transcript: Vec<String>,
    status: Vec<String>,
    status_changed: bool,
}

/// The writer plus how many status lines are currently on screen.
#[derive(Debug)]
struct Output<W> {
    writer: W,
    drawn: usize,
}

/// Terminal that keeps a status region below the scrolling transcript.
///
/// `print` and `set_status` only queue work; the screen is updated by
/// [`Terminal::run`] every refresh interval, or by [`LiveTerminal::flush`].
///
/// With the status region disabled only transcript lines are written and no
/// escape sequences reach the writer.
pub struct LiveTerminal<W: Write + Send = Stdout> {
    pending: Mutex<Pending>,
    output: Mutex<Output<W>>,
    refresh: Duration,
    /// Truncate status lines to the terminal width.
    fit_width: bool,
    /// Draw the status region at all.
    status_enabled: bool,
}

impl LiveTerminal<Stdout> {
    /// Live terminal on stdout. The status region is only drawn when stdout
    /// is a terminal; piped output gets the plain transcript.
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let tty = stdout.is_terminal();
        Self {
            fit_width: tty,
            status_enabled: tty,
            ..Self::with_writer(stdout)
        }
    }
}

impl<W: Write + Send> LiveTerminal<W> {
    /// Live terminal writing to `writer`.
    pub fn with_writer(writer: W) -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            output: Mutex::new(Output { writer, drawn: 0 }),
            refresh: Duration::from_millis(DEFAULT_REFRESH_MS),
            fit_width: false,
            status_enabled: true,
        }
    }

    /// Enable or disable the status region.
    pub fn with_status(mut self, enabled: bool) -> Self {
        self.status_enabled = enabled;
        self
    }

    /// Whether the status region is drawn.
    pub fn status_enabled(&self) -> bool {
        self.status_enabled
    }

    /// Set the redraw interval.
    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    /// Draw whatever is queued right now.
    pub fn flush(&self) -> io::Result<()> {
        self.render(true)
    }

    /// Consume the terminal and return its writer.
    pub fn into_writer(self) -> W {
        let output = self
            .output
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        output.writer
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_output(&self) -> MutexGuard<'_, Output<W>> {
        self.output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn width(&self) -> usize {
        if !self.fit_width {
            return usize::MAX;
        }
        terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(FALLBACK_WIDTH)
            .saturating_sub(1)
    }

    /// Erase the old status region, write queued transcript lines, and draw
    /// the status region again if `with_status` is set.
    fn render(&self, with_status: bool) -> io::Result<()> {
        if !self.status_enabled {
            return self.render_transcript();
        }

        let (transcript, status) = {
            let mut pending = self.lock_pending();
            let transcript = mem::take(&mut pending.transcript);
            let status = if pending.status_changed || !transcript.is_empty() {
                pending.status_changed = false;
                Some(pending.status.clone())
            } else {
                None
            };
            (transcript, status)
        };

        let mut out = self.lock_output();
        let Some(status) = status else {
            if !with_status && out.drawn > 0 {
                clear_status(&mut out)?;
                out.writer.flush()?;
            }
            return Ok(());
        };

        clear_status(&mut out)?;

        for line in &transcript {
            let line = line.strip_suffix('\n').unwrap_or(line);
            writeln!(out.writer, "{}", line)?;
        }

        if with_status {
            let width = self.width();
            for line in &status {
                writeln!(out.writer, "{}", fit_line(line, width))?;
            }
            out.drawn = status.len();
        }

        out.writer.flush()
    }

    /// Write queued transcript lines only.
    fn render_transcript(&self) -> io::Result<()> {
        let transcript = mem::take(&mut self.lock_pending().transcript);
        if transcript.is_empty() {
            return Ok(());
        }

        let mut out = self.lock_output();
        for line in &transcript {
            let line = line.strip_suffix('\n').unwrap_or(line);
            writeln!(out.writer, "{}", line)?;
        }
        out.writer.flush()
    }
}

/// Cut `line` to at most `width` terminal columns so it occupies exactly one
/// row. Control characters are replaced by spaces.
fn fit_line(line: &str, width: usize) -> String {
    let mut fitted = String::with_capacity(line.len());
    let mut used = 0;
    for c in line.chars() {
        let c = if c.is_control() { ' ' } else { c };
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        fitted.push(c);
    }
    fitted
}

fn clear_status<W: Write>(out: &mut Output<W>) -> io::Result<()> {
    if out.drawn > 0 {
        queue!(
            out.writer,
            MoveToPreviousLine(out.drawn as u16),
            Clear(ClearType::FromCursorDown)
        )?;
        out.drawn = 0;
    }
    Ok(())
}

impl<W: Write + Send> Terminal for LiveTerminal<W> {
    fn print(&self, line: &str) {
        self.lock_pending().transcript.push(line.to_string());
    }

    fn set_status(&self, lines: Vec<String>) {
        let mut pending = self.lock_pending();
        pending.status = lines;
        pending.status_changed = true;
    }

    fn run(&self, stop: &AtomicBool) {
        if self.status_enabled {
            if let Err(e) = queue!(self.lock_output().writer, Hide) {
                tracing::warn!(error = %e, "failed to hide cursor");
            }
        }

        while !stop.load(Ordering::SeqCst) {
            if let Err(e) = self.render(true) {
                tracing::warn!(error = %e, "terminal render failed, stopping");
                break;
            }
            thread::sleep(self.refresh);
        }

        // Leave the transcript on screen but drop the status region.
        let result = self.render(false).and_then(|()| {
            if !self.status_enabled {
                return Ok(());
            }
            let mut out = self.lock_output();
            queue!(out.writer, Show)?;
            out.writer.flush()
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    }
}
