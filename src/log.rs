//! The run-wide, append-only leak log.

use crate::errors::{Result, TestLeakError};
use crate::leak::LeakRecord;

/// All leaks detected during a run, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeakLog {
    records: Vec<LeakRecord>,
}

/// The leaks of one unit, as projected by [`LeakLog::group_by_unit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLeaks<'a> {
    pub unit_id: &'a str,
    pub records: Vec<&'a LeakRecord>,
}

impl LeakLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = LeakRecord>,
    {
        self.records.extend(records);
    }

    pub fn all(&self) -> &[LeakRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clear the whole log. Only meaningful at the start of a run.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Group records by unit, keeping the order in which units first leaked
    /// and the insertion order of records within each unit.
    pub fn group_by_unit(&self) -> Vec<UnitLeaks<'_>> {
        let mut groups: Vec<UnitLeaks<'_>> = Vec::new();
        for record in &self.records {
            match groups.iter_mut().find(|g| g.unit_id == record.unit_id()) {
                Some(group) => group.records.push(record),
                None => groups.push(UnitLeaks {
                    unit_id: record.unit_id(),
                    records: vec![record],
                }),
            }
        }
        groups
    }

    /// The JSON report: a pretty-printed array of records.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.records).map_err(TestLeakError::Serialize)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let records = serde_json::from_slice(bytes).map_err(TestLeakError::Deserialize)?;
        Ok(Self { records })
    }
}

impl From<Vec<LeakRecord>> for LeakLog {
    fn from(records: Vec<LeakRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a LeakLog {
    type Item = &'a LeakRecord;
    type IntoIter = std::slice::Iter<'a, LeakRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
