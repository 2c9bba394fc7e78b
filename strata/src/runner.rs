//! Applies and reverts migration units against a store, keeping the ledger in step.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

use crate::errors::{Direction, MigrationError, StoreError};
use crate::migration::{MigrationSet, MigrationUnit};
use crate::store::{MigrationLedger, MigrationRecord, SchemaStore};

/// Outcome of an `up` or `down` batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Unit ids applied (or reverted) in this batch, in execution order
    pub processed: Vec<String>,
    /// Units left alone: already applied for `up`, outside the window for `down`
    pub skipped: usize,
    /// Total execution time in milliseconds
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Pending,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub id: String,
    pub state: MigrationState,
    pub applied_at: Option<chrono::DateTime<chrono::Utc>>,
    /// The unit changed after it was applied.
    pub checksum_mismatch: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub migrations: Vec<MigrationStatus>,
    /// Ledger records with no matching unit in the set.
    pub orphaned: Vec<MigrationRecord>,
}

impl StatusReport {
    pub fn applied_count(&self) -> usize {
        self.migrations
            .iter()
            .filter(|status| status.state == MigrationState::Applied)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.migrations.len() - self.applied_count()
    }
}

/// Runs units of a [`MigrationSet`] strictly one at a time, in id order.
///
/// A unit is recorded in the ledger only after its transform succeeded, and
/// the first failure ends the batch. Everything finished before it stays
/// committed, so rerunning resumes at the failed unit.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    set: MigrationSet,
}

impl MigrationRunner {
    pub fn new(set: MigrationSet) -> Self {
        Self { set }
    }

    pub fn set(&self) -> &MigrationSet {
        &self.set
    }

    /// Applies every pending unit in ascending order.
    pub async fn up<S>(&self, store: &mut S) -> Result<RunReport, MigrationError>
    where
        S: SchemaStore + MigrationLedger,
    {
        let started = Instant::now();
        let applied = applied_ids(store).await?;
        let (done, pending): (Vec<_>, Vec<_>) = self.set.iter().partition(|unit| applied.contains(unit.id.as_str()));

        if pending.is_empty() {
            info!("all {} migration(s) are up to date", done.len());
        }

        let mut processed = Vec::with_capacity(pending.len());
        for unit in pending {
            let unit_started = Instant::now();
            info!("applying {}", unit.id);
            let fail = |source| failure(unit, Direction::Up, &processed, source);

            unit.up.apply(store).await.map_err(fail)?;
            let record = MigrationRecord::new(unit.id.as_str(), &unit.checksum, elapsed_ms(unit_started));
            store.insert_record(record).await.map_err(fail)?;

            info!("applied {} in {}ms", unit.id, elapsed_ms(unit_started));
            processed.push(unit.id.to_string());
        }

        Ok(RunReport {
            processed,
            skipped: done.len(),
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Reverts the `steps` most recently applied units, newest first.
    pub async fn down<S>(&self, store: &mut S, steps: usize) -> Result<RunReport, MigrationError>
    where
        S: SchemaStore + MigrationLedger,
    {
        let started = Instant::now();
        let (targets, total) = self.down_targets(store, steps).await?;

        let mut processed = Vec::with_capacity(targets.len());
        for unit in &targets {
            let unit_started = Instant::now();
            info!("reverting {}", unit.id);
            let fail = |source| failure(unit, Direction::Down, &processed, source);

            unit.down.apply(store).await.map_err(fail)?;
            store.remove_record(unit.id.as_str()).await.map_err(fail)?;

            info!("reverted {} in {}ms", unit.id, elapsed_ms(unit_started));
            processed.push(unit.id.to_string());
        }

        Ok(RunReport {
            processed,
            skipped: total - targets.len(),
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Pending ids `up` would apply, without touching the store.
    pub async fn plan_up<S: MigrationLedger>(&self, store: &mut S) -> Result<Vec<String>, MigrationError> {
        let applied = applied_ids(store).await?;
        Ok(self
            .set
            .iter()
            .filter(|unit| !applied.contains(unit.id.as_str()))
            .map(|unit| unit.id.to_string())
            .collect())
    }

    /// Ids `down(steps)` would revert, in execution order.
    pub async fn plan_down<S: MigrationLedger>(&self, store: &mut S, steps: usize) -> Result<Vec<String>, MigrationError> {
        let (targets, _) = self.down_targets(store, steps).await?;
        Ok(targets.into_iter().map(|unit| unit.id.to_string()).collect())
    }

    /// Applied/pending state of every known unit. Read-only.
    pub async fn status<S: MigrationLedger>(&self, store: &mut S) -> Result<StatusReport, MigrationError> {
        let records = store.applied().await?;
        let by_id: HashMap<&str, &MigrationRecord> = records.iter().map(|record| (record.id.as_str(), record)).collect();

        let migrations = self
            .set
            .iter()
            .map(|unit| {
                let record = by_id.get(unit.id.as_str());
                let checksum_mismatch = record.is_some_and(|record| record.checksum != unit.checksum);
                if checksum_mismatch {
                    warn!("migration {} changed after it was applied", unit.id);
                }
                MigrationStatus {
                    id: unit.id.to_string(),
                    state: if record.is_some() {
                        MigrationState::Applied
                    } else {
                        MigrationState::Pending
                    },
                    applied_at: record.map(|record| record.applied_at),
                    checksum_mismatch,
                    description: unit.description.clone(),
                }
            })
            .collect();

        let orphaned = records
            .iter()
            .filter(|record| !self.set.contains(&record.id))
            .cloned()
            .collect();

        Ok(StatusReport { migrations, orphaned })
    }

    /// Records `id` as applied without running it. `false` if it already was.
    pub async fn mark_applied<S: MigrationLedger>(&self, store: &mut S, id: &str) -> Result<bool, MigrationError> {
        let unit = self
            .set
            .get(id)
            .ok_or_else(|| MigrationError::UnknownMigration { id: id.to_string() })?;
        if applied_ids(store).await?.contains(id) {
            return Ok(false);
        }
        store
            .insert_record(MigrationRecord::new(unit.id.as_str(), &unit.checksum, 0))
            .await?;
        info!("marked {id} as applied");
        Ok(true)
    }

    /// Drops the ledger record for `id` without running its down transform.
    pub async fn mark_rolled_back<S: MigrationLedger>(&self, store: &mut S, id: &str) -> Result<bool, MigrationError> {
        let removed = store.remove_record(id).await?;
        if removed {
            info!("marked {id} as rolled back");
        }
        Ok(removed)
    }

    /// Units to revert for `down(steps)`, newest first, plus the applied count.
    /// Every target is resolved before anything runs.
    async fn down_targets<S: MigrationLedger>(
        &self,
        store: &mut S,
        steps: usize,
    ) -> Result<(Vec<&MigrationUnit>, usize), MigrationError> {
        let records = store.applied().await?;
        let targets = records
            .iter()
            .rev()
            .take(steps)
            .map(|record| {
                self.set
                    .get(&record.id)
                    .ok_or_else(|| MigrationError::UnknownMigration { id: record.id.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((targets, records.len()))
    }
}

async fn applied_ids<S: MigrationLedger>(store: &mut S) -> Result<HashSet<String>, StoreError> {
    Ok(store.applied().await?.into_iter().map(|record| record.id).collect())
}

fn failure(unit: &MigrationUnit, direction: Direction, completed: &[String], source: StoreError) -> MigrationError {
    warn!("migration {} failed ({direction}): {source}", unit.id);
    MigrationError::Failed {
        id: unit.id.to_string(),
        direction,
        completed: completed.to_vec(),
        source,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
