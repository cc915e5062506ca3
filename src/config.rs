//! Layered configuration: defaults, then an optional YAML file, then
//! `TESTLEAK_*` environment variables.
//!
//! ```yaml
//! report: target/testleak.json
//! fail: true
//! ignore: [RUST_LOG, TMPDIR]
//! search_path_var: PATH
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, TestLeakError};
use crate::ignore::IgnoreSet;
use crate::snapshot::{ProcessProbe, DEFAULT_SEARCH_PATH_VAR};

pub const CONFIG_FILE: &str = "testleak.yaml";
pub const CONFIG_VAR: &str = "TESTLEAK_CONFIG";
pub const REPORT_VAR: &str = "TESTLEAK_REPORT";
pub const FAIL_VAR: &str = "TESTLEAK_FAIL";
pub const IGNORE_VAR: &str = "TESTLEAK_IGNORE";
pub const SEARCH_PATH_VAR: &str = "TESTLEAK_SEARCH_PATH_VAR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where to write the JSON report, if anywhere.
    pub report_path: Option<PathBuf>,
    /// Whether any leak makes the run fail.
    pub fail_on_leak: bool,
    /// Extra variable names to ignore on top of the host-owned ones.
    pub ignore: Vec<String>,
    /// The path-list variable tracked as the search path.
    pub search_path_var: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_path: None,
            fail_on_leak: false,
            ignore: Vec::new(),
            search_path_var: DEFAULT_SEARCH_PATH_VAR.to_string(),
        }
    }
}

/// The on-disk shape; every field optional so files can be partial.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    report: Option<PathBuf>,
    fail: Option<bool>,
    #[serde(default)]
    ignore: Vec<String>,
    search_path_var: Option<String>,
}

impl Config {
    /// Load from the process environment and the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."), &testleak_vars())
    }

    /// Load with an explicit base directory and variable set.
    pub fn load_from(base: &Path, vars: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        let file = match vars.get(CONFIG_VAR) {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(base.join(CONFIG_FILE)).filter(|p| p.is_file()),
        };
        if let Some(path) = file {
            config.merge_file(&path)?;
        }

        config.merge_vars(vars);
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|e| TestLeakError::io(path, e))?;
        let file: FileConfig = serde_yaml::from_str(&text).map_err(|e| TestLeakError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if file.report.is_some() {
            self.report_path = file.report;
        }
        if let Some(fail) = file.fail {
            self.fail_on_leak = fail;
        }
        self.ignore.extend(file.ignore);
        if let Some(var) = file.search_path_var {
            self.search_path_var = var;
        }
        Ok(())
    }

    fn merge_vars(&mut self, vars: &BTreeMap<String, String>) {
        if let Some(report) = vars.get(REPORT_VAR).filter(|v| !v.is_empty()) {
            self.report_path = Some(PathBuf::from(report));
        }
        if let Some(fail) = vars.get(FAIL_VAR) {
            self.fail_on_leak = is_truthy(fail);
        }
        if let Some(ignore) = vars.get(IGNORE_VAR) {
            self.ignore.extend(
                ignore
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }
        if let Some(var) = vars.get(SEARCH_PATH_VAR).filter(|v| !v.is_empty()) {
            self.search_path_var = var.clone();
        }
    }

    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::with_extra(self.ignore.iter().cloned())
    }

    pub fn probe(&self) -> ProcessProbe {
        ProcessProbe::new(self.search_path_var.clone())
    }

    /// The variables that hand this configuration to a child test process.
    pub fn to_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![(FAIL_VAR, if self.fail_on_leak { "1" } else { "0" }.to_string())];
        if let Some(report) = &self.report_path {
            vars.push((REPORT_VAR, report.display().to_string()));
        }
        if !self.ignore.is_empty() {
            vars.push((IGNORE_VAR, self.ignore.join(",")));
        }
        if self.search_path_var != DEFAULT_SEARCH_PATH_VAR {
            vars.push((SEARCH_PATH_VAR, self.search_path_var.clone()));
        }
        vars
    }
}

/// The `TESTLEAK_*` variables of this process.
pub(crate) fn testleak_vars() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .filter(|(k, _)| k.starts_with("TESTLEAK_"))
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
