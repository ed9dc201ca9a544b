//! Transcript filters.
//!
//! Filters only decide whether a result is shown in the transcript. They never
//! influence the statistics, which count every result.

use std::collections::HashSet;

use crate::config::ReporterConfig;
use crate::probe::{Outcome, ProbeResult};

/// Decides whether a single result is hidden from the transcript.
pub trait ResultFilter: Send + Sync {
    /// Returns true if the result should not be printed.
    fn reject(&self, result: &ProbeResult) -> bool;
}

impl<F> ResultFilter for F
where
    F: Fn(&ProbeResult) -> bool + Send + Sync,
{
    fn reject(&self, result: &ProbeResult) -> bool {
        self(result)
    }
}

/// Hides responses with one of the given status codes.
#[derive(Debug, Clone, Default)]
pub struct HideStatus {
    codes: HashSet<u16>,
}

impl HideStatus {
    /// Create a filter hiding the given codes.
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }
}

impl ResultFilter for HideStatus {
    fn reject(&self, result: &ProbeResult) -> bool {
        match &result.outcome {
            Outcome::Response(r) => self.codes.contains(&r.status_code),
            Outcome::Error(_) => false,
        }
    }
}

/// Hides failed probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HideErrors;

impl ResultFilter for HideErrors {
    fn reject(&self, result: &ProbeResult) -> bool {
        result.is_error()
    }
}

/// Ordered list of filters applied to every result.
#[derive(Default)]
pub struct FilterSet {
    filters: Vec<Box<dyn ResultFilter>>,
}

impl FilterSet {
    /// Empty set; nothing is suppressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    pub fn with(mut self, filter: impl ResultFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Build the filters requested by the configuration.
    pub fn from_config(config: &ReporterConfig) -> Self {
        let mut set = Self::new();
        if !config.hide_status.is_empty() {
            set = set.with(HideStatus::new(config.hide_status.iter().copied()));
        }
        if config.hide_errors {
            set = set.with(HideErrors);
        }
        set
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether there are no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// True as soon as any filter rejects the result.
    pub fn should_suppress(&self, result: &ProbeResult) -> bool {
        self.filters.iter().any(|f| f.reject(result))
    }
}

impl std::fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSet")
            .field("filters", &self.filters.len())
            .finish()
    }
}
