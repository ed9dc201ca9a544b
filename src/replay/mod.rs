//! Replays recorded probe results from a JSON-lines file.
//!
//! Each non-blank line holds one record:
//!
//! ```text
//! {"label": "admin", "response": {"status_code": 200, "header_bytes": 120, "body_bytes": 3400}}
//! {"label": "backup", "error": "connection refused"}
//! ```
//!
//! The producer first counts the records and sends the total on the expected
//! channel, then streams the records on the result channel. Skipped records
//! lower the total as they are found.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Deserialize;

use crate::probe::{ProbeError, ProbeResult, Response};

/// Error type for replay operations.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Failed to read the input file.
    #[error("Failed to read input: {0}")]
    ReadError(#[from] io::Error),
    /// A line is not valid JSON.
    #[error("Line {line}: invalid record: {source}")]
    ParseError {
        /// 1-based line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A record has both or neither of `response` and `error`.
    #[error("Line {0}: record must have exactly one of `response` or `error`")]
    AmbiguousRecord(usize),
}

/// One line of a replay file.
#[derive(Debug, Deserialize)]
struct Record {
    label: String,
    #[serde(default)]
    response: Option<Response>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one line into a result.
pub fn parse_line(line: &str, number: usize) -> Result<ProbeResult, ReplayError> {
    let record: Record = serde_json::from_str(line).map_err(|source| ReplayError::ParseError {
        line: number,
        source,
    })?;

    match (record.response, record.error) {
        (Some(response), None) => Ok(ProbeResult::response(record.label, response)),
        (None, Some(message)) => Ok(ProbeResult::error(record.label, ProbeError::Other(message))),
        _ => Err(ReplayError::AmbiguousRecord(number)),
    }
}

/// Count non-blank lines.
pub fn count_records(path: &Path) -> Result<u64, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Send every valid record in `path` to `results`.
///
/// The record count goes to `expected` before the first result. Malformed
/// lines are logged and skipped, and each skip sends a lowered total.
/// Returns the number of results sent. Stops early if the reporter hangs up.
pub fn replay(
    path: &Path,
    results: &Sender<ProbeResult>,
    expected: &Sender<u64>,
    delay: Option<Duration>,
) -> Result<u64, ReplayError> {
    let mut total = count_records(path)?;
    // The expected total is best effort; the reporter may not listen.
    let _ = expected.send(total);

    let reader = BufReader::new(File::open(path)?);
    let mut sent = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let result = match parse_line(&line, index + 1) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "skipping record");
                total = total.saturating_sub(1);
                let _ = expected.send(total);
                continue;
            }
        };

        if results.send(result).is_err() {
            tracing::debug!("reporter went away, stopping replay");
            break;
        }
        sent += 1;

        if let Some(delay) = delay {
            thread::sleep(delay);
        }
    }

    Ok(sent)
}

/// Replay `path` on a background thread.
///
/// Both senders are dropped when the thread finishes, which closes the result
/// stream and ends the reporting loop.
pub fn spawn(
    path: PathBuf,
    results: Sender<ProbeResult>,
    expected: Sender<u64>,
    delay: Option<Duration>,
) -> JoinHandle<Result<u64, ReplayError>> {
    thread::spawn(move || {
        let sent = replay(&path, &results, &expected, delay)?;
        tracing::debug!(sent, path = %path.display(), "replay finished");
        Ok(sent)
    })
}
