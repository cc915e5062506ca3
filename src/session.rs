//! The in-process host: drives the snapshot/diff protocol around test bodies
//! and reports at the end of the run.
//!
//! ```rust,no_run
//! use testleak::Session;
//!
//! let mut session = Session::from_env().unwrap_or_default();
//! session.run_unit("tests/env.rs::sets_home", || {
//!     std::env::set_var("HOME", "/tmp");
//! });
//! let status = session.finish(&mut testleak::report::stdout());
//! std::process::exit(status.exit_code());
//! ```

use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use termcolor::WriteColor;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{Result, TestLeakError};
use crate::ignore::CURRENT_TEST_VAR;
use crate::leak::LeakRecord;
use crate::log::LeakLog;
use crate::report::{render_summary, write_report};
use crate::tracker::Tracker;

/// Outcome of a tracked run.
#[derive(Debug)]
pub struct RunStatus {
    pub leaks: usize,
    pub fail_on_leak: bool,
    /// Set when the report could not be written. Never affects the status.
    pub report_error: Option<TestLeakError>,
}

impl RunStatus {
    pub fn is_clean(&self) -> bool {
        self.leaks == 0
    }

    pub fn should_fail(&self) -> bool {
        self.fail_on_leak && !self.is_clean()
    }

    pub fn exit_code(&self) -> i32 {
        i32::from(self.should_fail())
    }
}

pub struct Session {
    config: Config,
    tracker: Tracker,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let tracker = Tracker::for_process(config.probe(), config.ignore_set());
        Self { config, tracker }
    }

    /// Configure from `TESTLEAK_*` variables and `testleak.yaml`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::load()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log(&self) -> &LeakLog {
        self.tracker.log()
    }

    /// Run `body` as one tracked unit.
    ///
    /// The diff happens whether the body returns or panics; a panic is
    /// resumed after its leaks have been logged.
    pub fn run_unit<F, T>(&mut self, unit_id: &str, body: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.tracker.snapshot();
        let previous = env::var_os(CURRENT_TEST_VAR);
        env::set_var(CURRENT_TEST_VAR, unit_id);

        let outcome = panic::catch_unwind(AssertUnwindSafe(body));

        restore(CURRENT_TEST_VAR, previous);
        let leaks = self.tracker.diff(unit_id).len();
        debug!(unit = unit_id, leaks, panicked = outcome.is_err(), "unit finished");

        match outcome {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Leaks recorded so far, for hosts that drive `Tracker` directly.
    pub fn leaks(&self) -> &[LeakRecord] {
        self.tracker.log().all()
    }

    /// Print the summary, write the report if configured, and compute the
    /// run status.
    pub fn finish(&self, out: &mut dyn WriteColor) -> RunStatus {
        let log = self.tracker.log();
        if let Err(e) = render_summary(log, out) {
            warn!(error = %e, "failed to print leak summary");
        }

        let report_error = match &self.config.report_path {
            Some(path) => match write_report(log, path) {
                Ok(()) => {
                    print_line(out, format_args!("\nReport written to {}", path.display()));
                    None
                }
                Err(e) => {
                    warn!(error = %e, "leak report not written");
                    print_line(out, format_args!("\nTestLeak: {e}"));
                    Some(e)
                }
            },
            None => None,
        };

        RunStatus {
            leaks: log.len(),
            fail_on_leak: self.config.fail_on_leak,
            report_error,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn print_line(out: &mut dyn WriteColor, line: std::fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{line}") {
        warn!(error = %e, "failed to print leak summary");
    }
}

fn restore(key: &str, previous: Option<OsString>) {
    match previous {
        Some(value) => env::set_var(key, value),
        None => env::remove_var(key),
    }
}
