//! The TestLeak command-line interface.
//!
//! `scan` hands tracking configuration to the test runner through
//! `TESTLEAK_*` variables and mirrors its exit status; `show` renders a saved
//! report and exits non-zero iff it lists any leak. Errors exit with status 2.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{self, Command as Process};

use clap::Parser;
use tracing::{debug, info};

use crate::cli::args::{Command, TestLeakArgs};
use crate::config::{testleak_vars, Config};
use crate::errors::{Result, TestLeakError};
use crate::report::{clear_report, read_report, render_report, stdout};

pub mod args;

const ERROR_EXIT: i32 = 2;

/// The main entry point for the CLI.
pub fn run() {
    let args = TestLeakArgs::parse();

    let result = match args.command {
        Command::Scan {
            path,
            report,
            fail,
            verbose,
            runner_args,
        } => scan(&path, report, fail, verbose, &runner_args),
        Command::Show { report_file } => show(&report_file),
        Command::Version => {
            println!("testleak {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(ERROR_EXIT);
        }
    }
}

// ============================================================================
// SCAN
// ============================================================================

fn scan(
    path: &Path,
    report: Option<PathBuf>,
    fail: bool,
    verbose: bool,
    runner_args: &[String],
) -> Result<i32> {
    let root = path.canonicalize().map_err(|e| TestLeakError::io(path, e))?;
    let mut config = Config::load_from(&root, &testleak_vars())?;
    if let Some(report) = report {
        config.report_path = Some(absolute(report)?);
    }
    config.fail_on_leak |= fail;
    // Test processes append to the report, so start the run from nothing.
    if let Some(report) = &config.report_path {
        clear_report(report)?;
    }

    let program = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let mut command = Process::new(&program);
    command.arg("test").current_dir(&root).envs(config.to_vars());
    if verbose {
        command.arg("--verbose");
    }
    if !runner_args.is_empty() {
        command.arg("--").args(runner_args);
    }

    info!(root = %root.display(), "running test suite with tracking");
    debug!(?command, "runner command");
    let status = command
        .status()
        .map_err(|source| TestLeakError::RunnerSpawn { program, source })?;
    Ok(status.code().unwrap_or(1))
}

/// The runner works in another directory, so relative report paths are
/// resolved against ours first.
fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir().map_err(|e| TestLeakError::io(".", e))?;
    Ok(cwd.join(path))
}

// ============================================================================
// SHOW
// ============================================================================

fn show(report_file: &Path) -> Result<i32> {
    let log = read_report(report_file)?;
    let mut out = stdout();
    render_report(&log, &mut out).map_err(|e| TestLeakError::io("<stdout>", e))?;
    Ok(i32::from(!log.is_empty()))
}
