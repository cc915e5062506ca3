//! TestLeak: detect test pollution.
//!
//! A [`Tracker`] snapshots process-global state (environment variables, the
//! search path, the working directory) before each unit of work and diffs it
//! afterwards, appending classified [`LeakRecord`]s to a run-wide
//! [`LeakLog`]. [`Session`] wraps that protocol around test bodies and
//! reports at the end of the run.

pub use crate::engine::DiffEngine;
pub use crate::errors::{Result, TestLeakError};
pub use crate::ignore::{IgnoreSet, CURRENT_TEST_VAR};
pub use crate::leak::{ChangeKind, LeakCategory, LeakRecord, CWD_KEY};
pub use crate::log::{LeakLog, UnitLeaks};
pub use crate::session::{RunStatus, Session};
pub use crate::snapshot::{capture, ProcessProbe, StateProbe, StateSnapshot};
pub use crate::tracker::Tracker;

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ignore;
pub mod leak;
pub mod log;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod surfaces;
pub mod tracker;
