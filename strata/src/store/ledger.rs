//! Applied-migration records, as persisted by every store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::migration::id::compare_ids;

/// One applied migration unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Unit id (e.g. "1747732722_updated_playlists")
    pub id: String,
    /// When the unit was applied
    pub applied_at: DateTime<Utc>,
    /// Checksum of the unit when it was applied
    pub checksum: String,
    /// Execution time in milliseconds
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl MigrationRecord {
    pub fn new(id: impl Into<String>, checksum: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            id: id.into(),
            applied_at: Utc::now(),
            checksum: checksum.into(),
            execution_time_ms,
        }
    }
}

/// Persisted ledger shape shared by the file and Redis stores: `{"applied": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub applied: Vec<MigrationRecord>,
}

impl LedgerDocument {
    pub fn contains(&self, id: &str) -> bool {
        self.applied.iter().any(|record| record.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.applied.iter().position(|record| record.id == id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                self.applied.remove(index);
                true
            }
            None => false,
        }
    }

    /// Records in ascending id order.
    pub fn sorted(mut self) -> Vec<MigrationRecord> {
        sort_records(&mut self.applied);
        self.applied
    }
}

pub fn sort_records(records: &mut [MigrationRecord]) {
    records.sort_by(|a, b| compare_ids(&a.id, &b.id));
}
