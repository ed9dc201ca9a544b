//! probe-report - live progress and statistics for concurrent HTTP probing.
//!
//! Probes run elsewhere and stream their results over a channel. The
//! [`Reporter`] counts them, prints a transcript line for each one that passes
//! the filters, and keeps a status region with throughput, remaining work and
//! a status-code histogram up to date.

#![deny(missing_docs)]

/// Version string from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod filter;
pub mod logging;
pub mod probe;
pub mod replay;
pub mod reporter;
pub mod stats;
pub mod terminal;

// Re-export key types for convenience
pub use filter::{FilterSet, ResultFilter};
pub use probe::{Outcome, ProbeError, ProbeResult, Response};
pub use reporter::Reporter;
pub use stats::{format_seconds, HttpStats};
pub use terminal::{LiveTerminal, LogTerminal, Terminal};
