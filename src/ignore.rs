//! Environment variables excluded from classification.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

/// Set by [`crate::Session`] to the id of the unit currently running, the
/// way test hosts publish their current test. Always ignored.
pub const CURRENT_TEST_VAR: &str = "TESTLEAK_CURRENT_TEST";

static HOST_OWNED: Lazy<BTreeSet<String>> =
    Lazy::new(|| [CURRENT_TEST_VAR].into_iter().map(String::from).collect());

/// Names of environment variables the host mutates on its own account.
///
/// Mutations of these never produce a leak record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    keys: BTreeSet<String>,
}

impl IgnoreSet {
    /// The host-owned defaults plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys = (*HOST_OWNED).clone();
        keys.extend(extra.into_iter().map(Into::into));
        Self { keys }
    }

    /// This set plus `key`.
    pub fn with(mut self, key: impl Into<String>) -> Self {
        self.keys.insert(key.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            keys: (*HOST_OWNED).clone(),
        }
    }
}
