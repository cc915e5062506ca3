//! The leak record data model.
//!
//! A [`LeakRecord`] is one observed change to process-global state, attributed
//! to the unit of work whose window it appeared in. Records are only built
//! through the constructors below, which keep `before`/`after` consistent with
//! the category.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel key used for working-directory leaks.
pub const CWD_KEY: &str = "cwd";

// ============================================================================
// CATEGORY
// ============================================================================

/// What kind of change a leak represents.
///
/// Serialized in snake_case (`env_added`, `path_added`, ...) to keep the
/// report schema stable for downstream tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakCategory {
    EnvAdded,
    EnvChanged,
    EnvRemoved,
    PathAdded,
    CwdChanged,
}

/// The shape of a category: which of `before`/`after` it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

impl LeakCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeakCategory::EnvAdded => "env_added",
            LeakCategory::EnvChanged => "env_changed",
            LeakCategory::EnvRemoved => "env_removed",
            LeakCategory::PathAdded => "path_added",
            LeakCategory::CwdChanged => "cwd_changed",
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            LeakCategory::EnvAdded | LeakCategory::PathAdded => ChangeKind::Added,
            LeakCategory::EnvChanged | LeakCategory::CwdChanged => ChangeKind::Changed,
            LeakCategory::EnvRemoved => ChangeKind::Removed,
        }
    }
}

impl fmt::Display for LeakCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// A single detected leak.
///
/// `unit_id` is serialized as `test_id`. Absent values serialize as `null`,
/// never as a missing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakRecord {
    #[serde(rename = "test_id")]
    unit_id: String,
    category: LeakCategory,
    key: String,
    before: Option<String>,
    after: Option<String>,
}

impl LeakRecord {
    /// A value that exists live but not in the baseline.
    ///
    /// `after` is optional because `path_added` carries its entry in `key`.
    pub fn added(
        unit_id: impl Into<String>,
        category: LeakCategory,
        key: impl Into<String>,
        after: Option<String>,
    ) -> Self {
        debug_assert_eq!(category.kind(), ChangeKind::Added);
        Self {
            unit_id: unit_id.into(),
            category,
            key: key.into(),
            before: None,
            after,
        }
    }

    /// A value present on both sides with different contents.
    pub fn changed(
        unit_id: impl Into<String>,
        category: LeakCategory,
        key: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        debug_assert_eq!(category.kind(), ChangeKind::Changed);
        Self {
            unit_id: unit_id.into(),
            category,
            key: key.into(),
            before: Some(before.into()),
            after: Some(after.into()),
        }
    }

    /// A value present in the baseline but gone live.
    pub fn removed(
        unit_id: impl Into<String>,
        category: LeakCategory,
        key: impl Into<String>,
        before: impl Into<String>,
    ) -> Self {
        debug_assert_eq!(category.kind(), ChangeKind::Removed);
        Self {
            unit_id: unit_id.into(),
            category,
            key: key.into(),
            before: Some(before.into()),
            after: None,
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn category(&self) -> LeakCategory {
        self.category
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }
}

/// Renders `[category] key: before -> after`, with absent values as `None`
/// and present values quoted.
impl fmt::Display for LeakRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} -> {}",
            self.category,
            self.key,
            Quoted(self.before()),
            Quoted(self.after())
        )
    }
}

struct Quoted<'a>(Option<&'a str>);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:?}"),
            None => f.write_str("None"),
        }
    }
}
