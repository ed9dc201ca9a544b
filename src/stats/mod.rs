//! Running statistics for a reporting session.
//!
//! [`HttpStats`] counts every result the reporter sees and renders the
//! status-region text: totals, smoothed throughput, remaining work and ETA,
//! and a histogram of status codes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::probe::{Outcome, ProbeResult};

/// Minimum spacing between throughput recomputations.
const RATE_INTERVAL: Duration = Duration::from_secs(1);

/// Format a number of seconds as `1h02m03s` or `2m03s`.
///
/// Fractions are truncated. Callers must pass a non-negative value; negative
/// input is treated as zero.
pub fn format_seconds(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h{:02}m{:02}s", hours, minutes, seconds)
    } else {
        format!("{}m{:02}s", minutes, seconds)
    }
}

/// Statistics collected over several HTTP responses.
#[derive(Debug, Clone)]
pub struct HttpStats {
    /// When the session started.
    start: Instant,
    /// Response count per status code.
    status_codes: HashMap<u16, u64>,
    /// Number of failed probes.
    errors: u64,
    /// Number of results processed so far.
    responses: u64,
    /// Planned total, 0 when unknown.
    expected: u64,
    /// When the rate was last recomputed.
    last_rate_update: Option<Instant>,
    /// Smoothed requests per second.
    rate: f64,
}

impl HttpStats {
    /// Start a new session now.
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Start a new session at the given instant.
    pub fn started_at(start: Instant) -> Self {
        Self {
            start,
            status_codes: HashMap::new(),
            errors: 0,
            responses: 0,
            expected: 0,
            last_rate_update: None,
            rate: 0.0,
        }
    }

    /// Count one result.
    pub fn record(&mut self, result: &ProbeResult) {
        self.responses += 1;
        match &result.outcome {
            Outcome::Error(_) => self.errors += 1,
            Outcome::Response(r) => *self.status_codes.entry(r.status_code).or_insert(0) += 1,
        }
    }

    /// Overwrite the planned total. 0 means unknown.
    pub fn set_expected(&mut self, expected: u64) {
        self.expected = expected;
    }

    /// Results processed so far.
    pub fn responses(&self) -> u64 {
        self.responses
    }

    /// Failed probes so far.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Planned total, 0 when unknown.
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Current smoothed rate in requests per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Response count per status code.
    pub fn status_codes(&self) -> &HashMap<u16, u64> {
        &self.status_codes
    }

    /// Wall time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Results still outstanding. Clamped at zero when the planned total
    /// falls below the processed count.
    pub fn todo(&self) -> u64 {
        self.expected.saturating_sub(self.responses)
    }

    /// Render the status region for the current moment.
    pub fn report(&mut self, current: &str) -> Vec<String> {
        self.report_at(current, Instant::now())
    }

    /// Render the status region as of `now`.
    ///
    /// The first line is blank, the second is the summary, and one line per
    /// status code follows.
    pub fn report_at(&mut self, current: &str, now: Instant) -> Vec<String> {
        self.update_rate(now);

        let mut status = format!("{} requests", self.responses);
        if self.rate > 0.0 {
            status.push_str(&format!(", {:.0} req/s", self.rate));
        }

        if self.expected > 0 {
            let todo = self.todo();
            status.push_str(&format!(", {} todo", todo));

            if self.rate > 0.0 {
                let remaining = todo as f64 / self.rate;
                status.push_str(&format!(", {} remaining", format_seconds(remaining)));
            }
        }

        if !current.is_empty() {
            status.push_str(&format!(", current: {}", current));
        }

        let mut lines = vec![String::new(), status];
        lines.extend(self.status_lines());
        lines
    }

    /// One `code: count` line per status code, sorted as strings.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .status_codes
            .iter()
            .map(|(code, count)| format!("{}: {}", code, count))
            .collect();
        lines.sort();
        lines
    }

    /// Recompute the cumulative average at most once per second.
    fn update_rate(&mut self, now: Instant) {
        let secs = now.saturating_duration_since(self.start).as_secs();
        if secs == 0 {
            return;
        }

        let due = match self.last_rate_update {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= RATE_INTERVAL,
        };
        if due {
            self.rate = self.responses as f64 / secs as f64;
            self.last_rate_update = Some(now);
        }
    }
}

impl Default for HttpStats {
    fn default() -> Self {
        Self::new()
    }
}
