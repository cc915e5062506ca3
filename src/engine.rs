//! The diff engine: baseline and live snapshots in, classified leaks out.

use tracing::debug;

use crate::ignore::IgnoreSet;
use crate::leak::LeakRecord;
use crate::snapshot::{StateProbe, StateSnapshot};
use crate::surfaces::{CwdSurface, Emitter, EnvSurface, SearchPathSurface, Surface};

/// Runs every registered surface, in a fixed order: environment, search
/// path, working directory.
///
/// The engine holds no mutable state; it is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    env: EnvSurface,
    search_path: SearchPathSurface,
    cwd: CwdSurface,
}

impl DiffEngine {
    pub fn new(ignore: IgnoreSet) -> Self {
        Self {
            env: EnvSurface::new(ignore),
            ..Self::default()
        }
    }

    pub fn ignore(&self) -> &IgnoreSet {
        self.env.ignore()
    }

    /// Read every surface through `probe`.
    pub fn capture(&self, probe: &dyn StateProbe) -> StateSnapshot {
        StateSnapshot::new(
            self.env.capture(probe),
            self.search_path.capture(probe),
            self.cwd.capture(probe),
        )
    }

    /// Classify the differences between `baseline` and `live` for `unit_id`.
    pub fn diff(
        &self,
        baseline: &StateSnapshot,
        live: &StateSnapshot,
        unit_id: &str,
    ) -> Vec<LeakRecord> {
        let mut records = Vec::new();
        let mut emit = Emitter::new(unit_id, &mut records);

        run_surface(&self.env, &baseline.environment, &live.environment, &mut emit);
        run_surface(&self.search_path, &baseline.search_path, &live.search_path, &mut emit);
        run_surface(&self.cwd, &baseline.working_directory, &live.working_directory, &mut emit);

        debug!(unit = unit_id, leaks = records.len(), "diffed state");
        records
    }
}

fn run_surface<S: Surface>(surface: &S, baseline: &S::State, live: &S::State, emit: &mut Emitter<'_>) {
    if baseline == live {
        return;
    }
    debug!(surface = surface.name(), "surface changed");
    surface.classify(baseline, live, emit);
}
