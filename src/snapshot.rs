//! Point-in-time capture of process-global state.
//!
//! A [`StateProbe`] reads the live surfaces; a [`StateSnapshot`] is the
//! immutable value produced from one read. The real process is read by
//! [`ProcessProbe`]; tests substitute their own probe.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;

use tracing::warn;

use crate::engine::DiffEngine;

/// Default path-list variable treated as the search path.
pub const DEFAULT_SEARCH_PATH_VAR: &str = "PATH";

// ============================================================================
// PROBES
// ============================================================================

/// Reads the live value of every tracked surface.
///
/// Implementations must not fail: unreadable values are coerced to text.
pub trait StateProbe {
    fn environment(&self) -> BTreeMap<String, String>;
    fn search_path(&self) -> Vec<String>;
    fn working_directory(&self) -> String;
}

/// Reads the state of the current process.
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    search_path_var: String,
}

impl ProcessProbe {
    pub fn new(search_path_var: impl Into<String>) -> Self {
        Self {
            search_path_var: search_path_var.into(),
        }
    }

    pub fn search_path_var(&self) -> &str {
        &self.search_path_var
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_PATH_VAR)
    }
}

impl StateProbe for ProcessProbe {
    fn environment(&self) -> BTreeMap<String, String> {
        env::vars_os()
            .map(|(key, value)| (lossy(key), lossy(value)))
            .collect()
    }

    fn search_path(&self) -> Vec<String> {
        match env::var_os(&self.search_path_var) {
            Some(raw) => env::split_paths(&raw)
                .map(|entry| lossy(entry.into_os_string()))
                .collect(),
            None => Vec::new(),
        }
    }

    fn working_directory(&self) -> String {
        match env::current_dir() {
            Ok(dir) => lossy(dir.into_os_string()),
            Err(e) => {
                warn!(error = %e, "working directory is unreadable; recording error text");
                format!("<unavailable: {e}>")
            }
        }
    }
}

fn lossy(value: OsString) -> String {
    value.into_string().unwrap_or_else(|raw| {
        let text = raw.to_string_lossy().into_owned();
        warn!(value = %text, "non-UTF-8 value coerced to text");
        text
    })
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable capture of the tracked global state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub(crate) environment: BTreeMap<String, String>,
    pub(crate) search_path: Vec<String>,
    pub(crate) working_directory: String,
}

impl StateSnapshot {
    pub fn new(
        environment: BTreeMap<String, String>,
        search_path: Vec<String>,
        working_directory: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            search_path,
            working_directory: working_directory.into(),
        }
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }
}

/// Capture the current process with the default probe and ignore set.
pub fn capture() -> StateSnapshot {
    DiffEngine::default().capture(&ProcessProbe::default())
}
