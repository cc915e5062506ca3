//! TestLeak error handling.
//!
//! The engine itself never fails: capture and diff are infallible by
//! construction. Errors only arise at the edges, where reports are read or
//! written, configuration is loaded, or the test runner is spawned.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TestLeakError>;

#[derive(Error, Diagnostic, Debug)]
pub enum TestLeakError {
    #[error("I/O error on '{path}': {source}")]
    #[diagnostic(code(testleak::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize leak report: {0}")]
    #[diagnostic(
        code(testleak::report::serialize),
        help("leak values are plain strings; this indicates a bug in testleak")
    )]
    Serialize(#[source] serde_json::Error),

    #[error("Malformed leak report: {0}")]
    #[diagnostic(
        code(testleak::report::deserialize),
        help("reports must be a JSON array of objects with test_id, category, key, before and after")
    )]
    Deserialize(#[source] serde_json::Error),

    #[error("Invalid configuration in '{path}': {message}")]
    #[diagnostic(code(testleak::config), help("see the Configuration section of the README"))]
    Config { path: PathBuf, message: String },

    #[error("Could not write leak report to '{path}': {source}")]
    #[diagnostic(
        code(testleak::report::write),
        help("the run status is unaffected; check that the destination directory exists and is writable")
    )]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch test runner '{program}': {source}")]
    #[diagnostic(code(testleak::scan::spawn), help("check that the runner is installed and on PATH"))]
    RunnerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl TestLeakError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
