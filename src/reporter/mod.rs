//! The reporting loop.
//!
//! [`Reporter::display`] consumes probe results until the producer closes the
//! channel. Each result is counted, printed unless a filter hides it, and the
//! status region is refreshed. A second channel carries the expected total;
//! it is polled without blocking and only the newest value is kept.

use std::sync::mpsc::{Receiver, TryRecvError};

use crate::filter::FilterSet;
use crate::probe::{header_line, ProbeResult};
use crate::stats::{format_seconds, HttpStats};
use crate::terminal::Terminal;

/// Prints probe results and live statistics to a terminal.
pub struct Reporter<T> {
    term: T,
    filters: FilterSet,
}

impl<T: Terminal> Reporter<T> {
    /// Create a reporter writing to `term`.
    pub fn new(term: T, filters: FilterSet) -> Self {
        Self { term, filters }
    }

    /// Consume the reporter, returning its terminal.
    pub fn into_terminal(self) -> T {
        self.term
    }

    /// Show incoming results until `results` is closed.
    ///
    /// Blocks on `results`; there is no timeout. Returns the statistics of the
    /// finished session.
    pub fn display(&self, results: Receiver<ProbeResult>, expected: Receiver<u64>) -> HttpStats {
        self.term.print(&header_line());

        let mut stats = HttpStats::new();
        let mut expected = Some(expected);
        tracing::debug!(filters = self.filters.len(), "reporting started");

        for result in results.iter() {
            if let Some(rx) = expected.as_ref() {
                match latest(rx) {
                    Latest::Value(total) => stats.set_expected(total),
                    Latest::Empty => {}
                    Latest::Closed(last) => {
                        if let Some(total) = last {
                            stats.set_expected(total);
                        }
                        expected = None;
                    }
                }
            }

            stats.record(&result);

            if !self.filters.should_suppress(&result) {
                self.term.print(&result.to_string());
            }

            self.term.set_status(stats.report(&result.label));
        }

        self.term.print("");
        self.term.print_fmt(format_args!(
            "processed {} HTTP requests in {}",
            stats.responses(),
            format_seconds(stats.elapsed().as_secs_f64())
        ));
        for line in stats.status_lines() {
            self.term.print(&line);
        }

        tracing::info!(
            responses = stats.responses(),
            errors = stats.errors(),
            "reporting finished"
        );
        stats
    }
}

/// Outcome of draining the expected-total channel.
enum Latest {
    /// Newest pending value.
    Value(u64),
    /// Nothing pending.
    Empty,
    /// Sender gone, with the last value drained on the way, if any.
    Closed(Option<u64>),
}

/// Take every pending value without blocking and keep only the newest.
fn latest(rx: &Receiver<u64>) -> Latest {
    let mut last = None;
    loop {
        match rx.try_recv() {
            Ok(total) => last = Some(total),
            Err(TryRecvError::Empty) => {
                return match last {
                    Some(total) => Latest::Value(total),
                    None => Latest::Empty,
                }
            }
            Err(TryRecvError::Disconnected) => return Latest::Closed(last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Print(String),
        Status(Vec<String>),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn printed(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Print(line) => Some(line),
                    Call::Status(_) => None,
                })
                .collect()
        }

        fn statuses(&self) -> Vec<Vec<String>> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Status(lines) => Some(lines),
                    Call::Print(_) => None,
                })
                .collect()
        }
    }

    impl Terminal for Recorder {
        fn print(&self, line: &str) {
            self.calls.lock().unwrap().push(Call::Print(line.to_string()));
        }

        fn set_status(&self, lines: Vec<String>) {
            self.calls.lock().unwrap().push(Call::Status(lines));
        }

        fn run(&self, _stop: &AtomicBool) {}
    }

    fn run_with(
        filters: FilterSet,
        results: Vec<ProbeResult>,
        expected: &[u64],
    ) -> (Recorder, HttpStats) {
        let (tx, rx) = mpsc::channel();
        let (count_tx, count_rx) = mpsc::channel();
        for total in expected {
            count_tx.send(*total).unwrap();
        }
        for result in results {
            tx.send(result).unwrap();
        }
        drop(tx);

        let reporter = Reporter::new(Recorder::default(), filters);
        let stats = reporter.display(rx, count_rx);
        drop(count_tx);
        (reporter.into_terminal(), stats)
    }

    #[test]
    fn test_header_printed_first() {
        let (term, _) = run_with(FilterSet::new(), vec![], &[]);
        assert_eq!(term.printed()[0], header_line());
    }

    #[test]
    fn test_every_result_printed_without_filters() {
        let results = vec![
            ProbeResult::status("a", 200),
            ProbeResult::status("b", 404),
            ProbeResult::error("c", ProbeError::Timeout),
        ];
        let (term, stats) = run_with(FilterSet::new(), results.clone(), &[]);

        let printed = term.printed();
        for result in &results {
            assert!(printed.contains(&result.to_string()));
        }
        assert_eq!(stats.responses(), 3);
        assert_eq!(stats.errors(), 1);
    }

    #[test]
    fn test_rejecting_filter_hides_all_but_counts() {
        let filters = FilterSet::new()
            .with(|_: &ProbeResult| true)
            .with(|_: &ProbeResult| false);
        let results = vec![ProbeResult::status("a", 200), ProbeResult::status("b", 500)];
        let (term, stats) = run_with(filters, results.clone(), &[]);

        let printed = term.printed();
        for result in &results {
            assert!(!printed.contains(&result.to_string()));
        }
        assert_eq!(stats.responses(), 2);
        assert_eq!(stats.status_codes().values().sum::<u64>(), 2);
        assert_eq!(term.statuses().len(), 2);
    }

    #[test]
    fn test_status_set_once_per_result_with_label() {
        let results = vec![ProbeResult::status("first", 200), ProbeResult::status("second", 200)];
        let (term, _) = run_with(FilterSet::new(), results, &[]);

        let statuses = term.statuses();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0][1].ends_with("current: first"));
        assert!(statuses[1][1].ends_with("current: second"));
    }

    #[test]
    fn test_end_to_end_with_expected_total() {
        let results = vec![
            ProbeResult::status("a", 200),
            ProbeResult::status("b", 200),
            ProbeResult::status("c", 404),
        ];
        let (term, stats) = run_with(FilterSet::new(), results, &[5]);

        let statuses = term.statuses();
        assert!(statuses[2][1].contains("2 todo"));
        assert_eq!(stats.expected(), 5);

        let printed = term.printed();
        assert!(printed.contains(&"200: 2".to_string()));
        assert!(printed.contains(&"404: 1".to_string()));
    }

    #[test]
    fn test_only_latest_expected_total_kept() {
        let (term, stats) = run_with(
            FilterSet::new(),
            vec![ProbeResult::status("a", 200)],
            &[10, 20, 7],
        );
        assert_eq!(stats.expected(), 7);
        assert!(term.statuses()[0][1].contains("6 todo"));
    }

    #[test]
    fn test_closing_summary_uses_print_only() {
        let results = vec![ProbeResult::status("a", 301), ProbeResult::status("b", 200)];
        let (term, _) = run_with(FilterSet::new(), results, &[]);

        let calls = term.calls();
        let last_status = calls
            .iter()
            .rposition(|c| matches!(c, Call::Status(_)))
            .unwrap();
        let tail: Vec<_> = calls[last_status + 1..].to_vec();

        assert_eq!(tail.len(), 4);
        assert!(tail.iter().all(|c| matches!(c, Call::Print(_))));
        assert_eq!(tail[0], Call::Print(String::new()));
        match &tail[1] {
            Call::Print(line) => assert!(line.starts_with("processed 2 HTTP requests in 0m0")),
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(tail[2], Call::Print("200: 1".to_string()));
        assert_eq!(tail[3], Call::Print("301: 1".to_string()));
    }

    #[test]
    fn test_empty_stream_still_summarises() {
        let (term, stats) = run_with(FilterSet::new(), vec![], &[3]);
        assert_eq!(stats.responses(), 0);
        assert!(term.statuses().is_empty());
        assert!(term.printed()[2].starts_with("processed 0 HTTP requests"));
    }

    #[test]
    fn test_latest_drains_channel() {
        let (tx, rx) = mpsc::channel();
        assert!(matches!(latest(&rx), Latest::Empty));
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert!(matches!(latest(&rx), Latest::Value(2)));
        assert!(matches!(latest(&rx), Latest::Empty));
        tx.send(3).unwrap();
        drop(tx);
        assert!(matches!(latest(&rx), Latest::Closed(Some(3))));
    }
}
