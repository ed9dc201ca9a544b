//! Probe results as streamed back from the workers.
//!
//! A [`ProbeResult`] pairs the input value that was probed (its label) with
//! either the response that came back or the error that prevented one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column header printed once at the top of the transcript.
///
/// Matches the column widths used by [`ProbeResult`]'s `Display` impl.
pub fn header_line() -> String {
    format!(
        "{:>7} {:>8} {:>8}   {:<8} {}",
        "status", "header", "body", "value", "extract"
    )
}

/// Error carried by a failed probe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Response descriptor for a successful probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// Size of the response header in bytes.
    #[serde(default)]
    pub header_bytes: u64,
    /// Size of the response body in bytes.
    #[serde(default)]
    pub body_bytes: u64,
    /// Values extracted from the body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extract: Vec<String>,
}

impl Response {
    /// Create a response with only a status code set.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }
}

/// What came back for a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server answered.
    Response(Response),
    /// The probe failed before a response was received.
    Error(ProbeError),
}

/// The outcome of one probed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The input value this probe was made for.
    pub label: String,
    /// Response or error.
    pub outcome: Outcome,
}

impl ProbeResult {
    /// Successful probe with the given response.
    pub fn response(label: impl Into<String>, response: Response) -> Self {
        Self {
            label: label.into(),
            outcome: Outcome::Response(response),
        }
    }

    /// Successful probe carrying only a status code.
    pub fn status(label: impl Into<String>, status_code: u16) -> Self {
        Self::response(label, Response::with_status(status_code))
    }

    /// Failed probe.
    pub fn error(label: impl Into<String>, error: ProbeError) -> Self {
        Self {
            label: label.into(),
            outcome: Outcome::Error(error),
        }
    }

    /// Status code, if the probe got a response.
    pub fn status_code(&self) -> Option<u16> {
        match &self.outcome {
            Outcome::Response(r) => Some(r.status_code),
            Outcome::Error(_) => None,
        }
    }

    /// Whether the probe failed.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Response(r) => write!(
                f,
                "{:>7} {:>8} {:>8}   {:<8} {}",
                r.status_code,
                r.header_bytes,
                r.body_bytes,
                self.label,
                r.extract.join(", ")
            ),
            Outcome::Error(e) => write!(
                f,
                "{:>7} {:>8} {:>8}   {:<8} {}",
                "error", "-", "-", self.label, e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line_columns() {
        let header = header_line();
        assert!(header.starts_with(" status"));
        assert!(header.contains("header"));
        assert!(header.ends_with("extract"));
    }

    #[test]
    fn test_display_response_is_single_line() {
        let result = ProbeResult::response(
            "admin",
            Response {
                status_code: 200,
                header_bytes: 120,
                body_bytes: 3400,
                extract: vec!["token".to_string(), "id".to_string()],
            },
        );
        let line = result.to_string();
        assert_eq!(line, "    200      120     3400   admin    token, id");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_display_error() {
        let result = ProbeResult::error("x", ProbeError::Timeout);
        let line = result.to_string();
        assert!(line.contains("error"));
        assert!(line.contains("request timed out"));
    }

    #[test]
    fn test_status_code_accessor() {
        assert_eq!(ProbeResult::status("a", 404).status_code(), Some(404));
        let err = ProbeResult::error("a", ProbeError::Other("boom".into()));
        assert_eq!(err.status_code(), None);
        assert!(err.is_error());
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::Connect("refused".to_string());
        assert_eq!(err.to_string(), "connection failed: refused");
    }
}
