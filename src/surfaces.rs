//! Trackable state surfaces.
//!
//! Each surface knows how to capture a comparable value through a
//! [`StateProbe`] and how to classify a live value against a baseline. New
//! surfaces implement [`Surface`] and are registered in
//! [`crate::engine::DiffEngine`]; existing classification is untouched.

use std::collections::{BTreeMap, HashSet};

use crate::ignore::IgnoreSet;
use crate::leak::{LeakCategory, LeakRecord, CWD_KEY};
use crate::snapshot::StateProbe;

/// A piece of process-global state that can leak between units.
pub trait Surface {
    type State: Clone + PartialEq;

    fn name(&self) -> &'static str;

    fn capture(&self, probe: &dyn StateProbe) -> Self::State;

    /// Emit one record per leak. Must emit nothing when `baseline == live`.
    fn classify(&self, baseline: &Self::State, live: &Self::State, emit: &mut Emitter<'_>);
}

/// Collects records for one unit, tagging each with the unit id.
pub struct Emitter<'a> {
    unit_id: &'a str,
    records: &'a mut Vec<LeakRecord>,
}

impl<'a> Emitter<'a> {
    pub fn new(unit_id: &'a str, records: &'a mut Vec<LeakRecord>) -> Self {
        Self { unit_id, records }
    }

    pub fn added(&mut self, category: LeakCategory, key: &str, after: Option<&str>) {
        self.records.push(LeakRecord::added(
            self.unit_id,
            category,
            key,
            after.map(str::to_owned),
        ));
    }

    pub fn changed(&mut self, category: LeakCategory, key: &str, before: &str, after: &str) {
        self.records
            .push(LeakRecord::changed(self.unit_id, category, key, before, after));
    }

    pub fn removed(&mut self, category: LeakCategory, key: &str, before: &str) {
        self.records
            .push(LeakRecord::removed(self.unit_id, category, key, before));
    }
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Environment variables, minus the ignore set.
#[derive(Debug, Clone, Default)]
pub struct EnvSurface {
    ignore: IgnoreSet,
}

impl EnvSurface {
    pub fn new(ignore: IgnoreSet) -> Self {
        Self { ignore }
    }

    pub fn ignore(&self) -> &IgnoreSet {
        &self.ignore
    }
}

impl Surface for EnvSurface {
    type State = BTreeMap<String, String>;

    fn name(&self) -> &'static str {
        "environment"
    }

    fn capture(&self, probe: &dyn StateProbe) -> Self::State {
        probe.environment()
    }

    fn classify(&self, baseline: &Self::State, live: &Self::State, emit: &mut Emitter<'_>) {
        for (key, value) in live {
            if self.ignore.contains(key) {
                continue;
            }
            match baseline.get(key) {
                None => emit.added(LeakCategory::EnvAdded, key, Some(value.as_str())),
                Some(before) if before != value => {
                    emit.changed(LeakCategory::EnvChanged, key, before, value)
                }
                Some(_) => {}
            }
        }
        for (key, before) in baseline {
            if !live.contains_key(key) && !self.ignore.contains(key) {
                emit.removed(LeakCategory::EnvRemoved, key, before);
            }
        }
    }
}

// ============================================================================
// SEARCH PATH
// ============================================================================

/// Entries of the search path. Only net-new entries are a signal; removals
/// and reordering are not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPathSurface;

impl Surface for SearchPathSurface {
    type State = Vec<String>;

    fn name(&self) -> &'static str {
        "search_path"
    }

    fn capture(&self, probe: &dyn StateProbe) -> Self::State {
        probe.search_path()
    }

    fn classify(&self, baseline: &Self::State, live: &Self::State, emit: &mut Emitter<'_>) {
        let known: HashSet<&str> = baseline.iter().map(String::as_str).collect();
        let mut reported = HashSet::new();
        for entry in live {
            if !known.contains(entry.as_str()) && reported.insert(entry.as_str()) {
                emit.added(LeakCategory::PathAdded, entry, None);
            }
        }
    }
}

// ============================================================================
// WORKING DIRECTORY
// ============================================================================

/// The current working directory. Intermediate changes collapse into one
/// record from the baseline value to the live value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CwdSurface;

impl Surface for CwdSurface {
    type State = String;

    fn name(&self) -> &'static str {
        "working_directory"
    }

    fn capture(&self, probe: &dyn StateProbe) -> Self::State {
        probe.working_directory()
    }

    fn classify(&self, baseline: &Self::State, live: &Self::State, emit: &mut Emitter<'_>) {
        if baseline != live {
            emit.changed(LeakCategory::CwdChanged, CWD_KEY, baseline, live);
        }
    }
}
