//! The tracking context: one current baseline and the run's leak log.
//!
//! One `Tracker` per process. Environment variables, the search path and the
//! working directory are process-global, so units running concurrently in the
//! same process would have their leaks misattributed. Run parallel suites in
//! separate processes, each with its own tracker. `snapshot` and `diff` take
//! `&mut self`, which serializes calls within a context.

use tracing::debug;

use crate::engine::DiffEngine;
use crate::ignore::IgnoreSet;
use crate::leak::LeakRecord;
use crate::log::LeakLog;
use crate::snapshot::{ProcessProbe, StateProbe, StateSnapshot};

pub struct Tracker {
    probe: Box<dyn StateProbe>,
    engine: DiffEngine,
    baseline: Option<StateSnapshot>,
    log: LeakLog,
}

impl Tracker {
    pub fn new(probe: Box<dyn StateProbe>, engine: DiffEngine) -> Self {
        Self {
            probe,
            engine,
            baseline: None,
            log: LeakLog::new(),
        }
    }

    /// Track the current process with the given ignore set.
    ///
    /// The search-path variable is left to the search-path surface, so the
    /// environment pass ignores it.
    pub fn for_process(probe: ProcessProbe, ignore: IgnoreSet) -> Self {
        let ignore = ignore.with(probe.search_path_var());
        Self::new(Box::new(probe), DiffEngine::new(ignore))
    }

    /// Capture a fresh baseline, replacing any previous one.
    pub fn snapshot(&mut self) {
        self.baseline = Some(self.engine.capture(self.probe.as_ref()));
    }

    /// Compare the live state against the current baseline and log any leaks
    /// under `unit_id`. Returns the records this call added.
    ///
    /// The baseline is consumed: without an intervening [`Tracker::snapshot`]
    /// the next call is a no-op, as is a call before any snapshot at all.
    pub fn diff(&mut self, unit_id: &str) -> &[LeakRecord] {
        let start = self.log.len();
        let Some(baseline) = self.baseline.take() else {
            debug!(unit = unit_id, "diff without snapshot; skipping");
            return &self.log.all()[start..];
        };
        let live = self.engine.capture(self.probe.as_ref());
        let records = self.engine.diff(&baseline, &live, unit_id);
        self.log.append(records);
        &self.log.all()[start..]
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    /// Forget the baseline and clear the log for a new run.
    pub fn reset(&mut self) {
        self.baseline = None;
        self.log.reset();
    }

    pub fn log(&self) -> &LeakLog {
        &self.log
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::for_process(ProcessProbe::default(), IgnoreSet::default())
    }
}
