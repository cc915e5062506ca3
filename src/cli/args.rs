//! Defines the command-line arguments and subcommands for the TestLeak CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(name = "testleak", about = "Find test pollution before it finds you.")]
pub struct TestLeakArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the test suite with pollution tracking enabled.
    Scan {
        /// The project directory to test.
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Write the JSON leak report to this file.
        #[arg(short, long)]
        report: Option<PathBuf>,
        /// Exit non-zero if any leak is detected.
        #[arg(long)]
        fail: bool,
        /// Ask the test runner for verbose output.
        #[arg(short, long)]
        verbose: bool,
        /// Extra arguments passed through to the test runner.
        #[arg(last = true)]
        runner_args: Vec<String>,
    },
    /// Display a saved leak report.
    Show {
        /// Path to the JSON report.
        #[arg(required = true)]
        report_file: PathBuf,
    },
    /// Print the version.
    Version,
}
