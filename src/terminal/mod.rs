//! Terminal output with a live status region.
//!
//! A [`Terminal`] has two surfaces: an append-only transcript and a status
//! region that is replaced wholesale on every update. The reporter only
//! talks to this trait, so tests can plug in an in-memory double.

mod live;
mod log;

use std::fmt;
use std::sync::atomic::AtomicBool;

pub use live::LiveTerminal;
pub use log::LogTerminal;

/// Prints data with an intermediate status region.
///
/// Implementations must be safe to call from the reporting thread while
/// [`Terminal::run`] executes on another.
pub trait Terminal: Send + Sync {
    /// Append a line to the transcript.
    fn print(&self, line: &str);

    /// Append a formatted line to the transcript.
    fn print_fmt(&self, args: fmt::Arguments<'_>) {
        self.print(&args.to_string());
    }

    /// Replace the status region with `lines`.
    fn set_status(&self, lines: Vec<String>);

    /// Render until `stop` is set.
    fn run(&self, stop: &AtomicBool);
}

impl<T: Terminal + ?Sized> Terminal for std::sync::Arc<T> {
    fn print(&self, line: &str) {
        (**self).print(line)
    }

    fn print_fmt(&self, args: fmt::Arguments<'_>) {
        (**self).print_fmt(args)
    }

    fn set_status(&self, lines: Vec<String>) {
        (**self).set_status(lines)
    }

    fn run(&self, stop: &AtomicBool) {
        (**self).run(stop)
    }
}
