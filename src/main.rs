//! probe-report - live progress and statistics for concurrent HTTP probing.
//!
//! This is the main entry point for the probe-report CLI tool.

use clap::Parser;
use probe_report::cli::Cli;
use probe_report::logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.execute() {
        Ok(_) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
