//! Migration file discovery.

use anyhow::{Context, Result, bail};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A migration unit found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Id derived from the file name, e.g. "1747732722_updated_playlists"
    pub id: String,
    /// Absolute path, suitable for `include_str!`
    pub path: PathBuf,
}

/// Find every migration file directly under `path`, in apply order.
///
/// Hidden files and files that are not `.json` are ignored. A missing
/// directory yields no migrations. A `.json` file whose name is not a valid
/// migration id fails the scan, the same way the runtime loader would.
pub fn scan_directory(path: &Path) -> Result<Vec<MigrationFile>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_path = entry.path();
        if let Some(id) = migration_id(file_path)? {
            let absolute = file_path
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", file_path.display()))?;
            files.push(MigrationFile { id, path: absolute });
        }
    }

    files.sort_by(|a, b| compare_ids(&a.id, &b.id));
    Ok(files)
}

/// Id for a file name, or `None` if the file is not a migration unit.
fn migration_id(path: &Path) -> Result<Option<String>> {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return Ok(None);
    };
    let Some(stem) = name.strip_suffix(".json") else {
        return Ok(None);
    };
    if name.starts_with('.') {
        return Ok(None);
    }
    let id = stem.strip_prefix('_').unwrap_or(stem);
    if let Some(reason) = invalid_reason(id) {
        bail!("Invalid migration id '{id}' ({}): {reason}", path.display());
    }
    Ok(Some(id.to_string()))
}

/// Mirrors the id rules enforced by `strata::MigrationId`.
fn invalid_reason(id: &str) -> Option<&'static str> {
    if id.is_empty() {
        return Some("id is empty");
    }
    if !id.starts_with(|c: char| c.is_ascii_digit()) {
        return Some("id must start with a numeric timestamp");
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Some("id may only contain letters, digits, '_' and '-'");
    }
    None
}

fn numeric_prefix(id: &str) -> u128 {
    id.chars()
        .take_while(char::is_ascii_digit)
        .try_fold(0u128, |acc, c| acc.checked_mul(10)?.checked_add(u128::from(c.to_digit(10)?)))
        .unwrap_or(u128::MAX)
}

/// Same ordering the runtime uses: numeric timestamp prefix, then the full id.
fn compare_ids(a: &str, b: &str) -> Ordering {
    numeric_prefix(a).cmp(&numeric_prefix(b)).then_with(|| a.cmp(b))
}
