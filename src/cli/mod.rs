//! CLI arguments and session wiring.
//!
//! Parses the command line, merges it with the config file, and runs one
//! reporting session: a replay producer feeds the reporter, which draws to a
//! live terminal (mirrored into a log file when asked).

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use clap::Parser;

use crate::config::{ConfigError, Overrides, ReporterConfig};
use crate::filter::FilterSet;
use crate::replay::{self, ReplayError};
use crate::reporter::Reporter;
use crate::stats::HttpStats;
use crate::terminal::{LiveTerminal, LogTerminal, Terminal};

/// Exit code used when interrupted with Ctrl+C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Replay probe results with a live status display.
///
/// Reads recorded results (one JSON object per line), prints each result as
/// it arrives, and keeps a running summary of throughput, remaining work and
/// status codes at the bottom of the terminal.
///
/// Examples:
///   probe-report results.jsonl
///   probe-report --hide-status 404,403 --log run.log results.jsonl
///   probe-report --delay-ms 20 results.jsonl
#[derive(Parser, Debug)]
#[command(name = "probe-report")]
#[command(author, version = crate::VERSION, about, long_about = None)]
pub struct Cli {
    /// JSON-lines file of probe results.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Config file (defaults to .probe-report.json if present).
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the transcript to this file.
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Hide responses with these status codes (comma separated).
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    pub hide_status: Vec<u16>,

    /// Hide failed probes from the transcript.
    #[arg(long)]
    pub hide_errors: bool,

    /// Pause between replayed results, in milliseconds.
    #[arg(short = 'd', long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Status region redraw interval, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub refresh_ms: Option<u64>,

    /// Enable debug logging on stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Error type for a CLI session.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Config could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The input file does not exist.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),
    /// The log file could not be created.
    #[error("Failed to create log file {path}: {source}")]
    LogFile {
        /// Requested log path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Replaying the input failed.
    #[error(transparent)]
    Replay(#[from] ReplayError),
    /// The producer thread panicked.
    #[error("Result producer panicked")]
    ProducerPanicked,
}

impl Cli {
    /// Command-line values that override the config file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            log_file: self.log.clone(),
            hide_status: self.hide_status.clone(),
            hide_errors: self.hide_errors,
            refresh_ms: self.refresh_ms,
        }
    }

    /// Load the config file and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<ReporterConfig, ConfigError> {
        let config = ReporterConfig::load(self.config.as_deref())?.merge(self.overrides());
        config.validate()?;
        Ok(config)
    }

    /// Run one reporting session.
    pub fn execute(&self) -> Result<HttpStats, CliError> {
        let config = self.resolve_config()?;
        if !self.input.exists() {
            return Err(CliError::InputNotFound(self.input.clone()));
        }

        let filters = FilterSet::from_config(&config);
        let live = LiveTerminal::stdout().with_refresh(Duration::from_millis(config.refresh_ms));
        let delay = self.delay_ms.map(Duration::from_millis);

        match &config.log_file {
            Some(path) => {
                let file = File::create(path).map_err(|source| CliError::LogFile {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "mirroring transcript");
                run_session(LogTerminal::new(live, file), filters, self.input.clone(), delay)
            }
            None => run_session(live, filters, self.input.clone(), delay),
        }
    }
}

/// Start the render loop and the producer, run the reporter on this thread,
/// then stop the render loop once the stream is closed.
pub fn run_session<T: Terminal + 'static>(
    term: T,
    filters: FilterSet,
    input: PathBuf,
    delay: Option<Duration>,
) -> Result<HttpStats, CliError> {
    let term = Arc::new(term);
    let stop = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&stop), Arc::clone(&interrupted));

    let render = {
        let term = Arc::clone(&term);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            if render_until_stopped(&*term, &stop, &interrupted) {
                eprintln!("\n\x1b[33mInterrupted\x1b[0m");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
    };

    let (results_tx, results_rx) = mpsc::channel();
    let (expected_tx, expected_rx) = mpsc::channel();
    let producer = replay::spawn(input, results_tx, expected_tx, delay);

    let reporter = Reporter::new(Arc::clone(&term), filters);
    let stats = reporter.display(results_rx, expected_rx);

    stop.store(true, Ordering::SeqCst);
    if render.join().is_err() {
        tracing::warn!("render thread panicked");
    }

    match producer.join() {
        Ok(Ok(_)) => Ok(stats),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(CliError::ProducerPanicked),
    }
}

/// Run the render loop until `stop` is set. Returns true if it was stopped
/// by an interrupt rather than by the end of the stream.
///
/// The loop's final pass writes queued transcript lines, erases the status
/// region and restores the cursor before this returns.
fn render_until_stopped<T: Terminal + ?Sized>(
    term: &T,
    stop: &AtomicBool,
    interrupted: &AtomicBool,
) -> bool {
    term.run(stop);
    interrupted.load(Ordering::SeqCst)
}

/// Mark the session as interrupted and ask the render loop to stop.
fn interrupt(stop: &AtomicBool, interrupted: &AtomicBool) {
    interrupted.store(true, Ordering::SeqCst);
    stop.store(true, Ordering::SeqCst);
}

/// On Ctrl+C, stop the render loop; the render thread exits the process once
/// the terminal is restored.
fn install_interrupt_handler(stop: Arc<AtomicBool>, interrupted: Arc<AtomicBool>) {
    let handler_result = ctrlc::set_handler(move || interrupt(&stop, &interrupted));

    if let Err(e) = handler_result {
        // Non-fatal: just log and continue without handler
        tracing::warn!(error = %e, "could not set up Ctrl+C handler");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Terminal for Recorder {
        fn print(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }

        fn set_status(&self, _lines: Vec<String>) {}

        fn run(&self, stop: &AtomicBool) {
            while !stop.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from([
            "probe-report",
            "--hide-status",
            "404,500",
            "--hide-errors",
            "-l",
            "out.log",
            "in.jsonl",
        ]);
        assert_eq!(cli.input, PathBuf::from("in.jsonl"));
        assert_eq!(cli.hide_status, vec![404, 500]);
        assert!(cli.hide_errors);
        assert_eq!(cli.log, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn test_resolve_config_merges_file_and_flags() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.json");
        fs::write(&config_path, r#"{"hide_status": [403], "refresh_ms": 200}"#).unwrap();

        let cli = Cli::parse_from([
            "probe-report",
            "-c",
            config_path.to_str().unwrap(),
            "--hide-status",
            "404",
            "in.jsonl",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.hide_status, vec![403, 404]);
        assert_eq!(config.refresh_ms, 200);
    }

    #[test]
    fn test_resolve_config_rejects_zero_refresh_flag() {
        let cli = Cli::parse_from(["probe-report", "--refresh-ms", "0", "in.jsonl"]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn test_execute_missing_input() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.jsonl");
        let cli = Cli::parse_from([
            "probe-report",
            "-c",
            temp.path().join("none.json").to_str().unwrap(),
            missing.to_str().unwrap(),
        ]);
        let err = cli.execute().unwrap_err();
        assert!(matches!(err, CliError::InputNotFound(_)));
    }

    #[test]
    fn test_interrupt_flushes_queued_lines_before_exit() {
        let term = LiveTerminal::with_writer(Vec::new()).with_refresh(Duration::from_millis(5));
        term.print("queued");
        term.set_status(vec!["3 requests".to_string()]);

        let stop = AtomicBool::new(false);
        let interrupted = AtomicBool::new(false);
        interrupt(&stop, &interrupted);

        assert!(render_until_stopped(&term, &stop, &interrupted));
        let out = String::from_utf8(term.into_writer()).unwrap();
        assert!(out.starts_with("\x1b[?25lqueued\n"));
        assert!(!out.contains("3 requests"));
        assert!(out.ends_with("\x1b[?25h"));
    }

    #[test]
    fn test_render_ends_without_interrupt() {
        let stop = AtomicBool::new(true);
        let interrupted = AtomicBool::new(false);
        assert!(!render_until_stopped(&Recorder::default(), &stop, &interrupted));
    }

    #[test]
    fn test_run_session_reports_everything() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.jsonl");
        fs::write(
            &input,
            concat!(
                r#"{"label": "a", "response": {"status_code": 200}}"#,
                "\n",
                r#"{"label": "b", "response": {"status_code": 404}}"#,
                "\n",
            ),
        )
        .unwrap();

        let stats = run_session(Recorder::default(), FilterSet::new(), input, None).unwrap();
        assert_eq!(stats.responses(), 2);
        assert_eq!(stats.expected(), 2);
    }
}
