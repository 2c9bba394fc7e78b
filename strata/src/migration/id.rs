use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::MigrationError;

/// Sortable identifier of a migration unit, e.g. `1747732722_updated_playlists`.
///
/// Ids start with a numeric timestamp prefix. Ordering compares that prefix
/// numerically and falls back to the full string, so `9_a < 10_a < 10_b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(raw: impl Into<String>) -> Result<Self, MigrationError> {
        let raw = raw.into();
        if let Some(reason) = invalid_reason(&raw) {
            return Err(MigrationError::InvalidId { id: raw, reason });
        }
        Ok(Self(raw))
    }

    /// Derives an id from a migration file name, dropping the extension and a
    /// leading underscore (`_1747732722_updated_playlists.json`).
    pub fn from_file_name(path: &Path) -> Result<Self, MigrationError> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Self::new(stem.strip_prefix('_').unwrap_or(stem))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the leading digit run.
    pub fn timestamp(&self) -> u128 {
        numeric_prefix(&self.0)
    }
}

fn invalid_reason(raw: &str) -> Option<&'static str> {
    if raw.is_empty() {
        return Some("id is empty");
    }
    if !raw.starts_with(|c: char| c.is_ascii_digit()) {
        return Some("id must start with a numeric timestamp");
    }
    if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Some("id may only contain letters, digits, '_' and '-'");
    }
    None
}

fn numeric_prefix(raw: &str) -> u128 {
    raw.chars()
        .take_while(char::is_ascii_digit)
        .try_fold(0u128, |acc, c| {
            acc.checked_mul(10)?.checked_add(u128::from(c.to_digit(10)?))
        })
        .unwrap_or(u128::MAX)
}

/// Orders two raw ids the way [`MigrationId`] does. Ledger records hold plain
/// strings, so they are sorted through this.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    numeric_prefix(a).cmp(&numeric_prefix(b)).then_with(|| a.cmp(b))
}

impl Ord for MigrationId {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ids(&self.0, &other.0)
    }
}

impl PartialOrd for MigrationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MigrationId {
    type Error = MigrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for MigrationId {
    type Error = MigrationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MigrationId> for String {
    fn from(id: MigrationId) -> Self {
        id.0
    }
}
