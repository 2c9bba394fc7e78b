//! Discovery of migration files on disk.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::errors::MigrationError;
use crate::migration::id::MigrationId;
use crate::migration::set::MigrationSet;
use crate::migration::unit::MigrationUnit;

/// Loads every `*.json` unit directly inside `dir`.
///
/// Hidden files and other extensions are ignored. A missing directory is an
/// empty set, so a fresh project can run `status` before creating anything.
pub fn load_dir(dir: &Path) -> Result<MigrationSet, MigrationError> {
    let mut set = MigrationSet::new();
    if !dir.exists() {
        return Ok(set);
    }

    let entries = fs::read_dir(dir).map_err(read_error(dir))?;
    for entry in entries {
        let path = entry.map_err(read_error(dir))?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.starts_with('.') || !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        let id = MigrationId::from_file_name(&path)?;
        let source = fs::read_to_string(&path).map_err(read_error(&path))?;
        debug!("loaded migration {id} from {}", path.display());
        set.insert(MigrationUnit::parse(id, &source)?)?;
    }
    Ok(set)
}

fn read_error(path: &Path) -> impl FnOnce(io::Error) -> MigrationError + use<> {
    let path = path.to_path_buf();
    move |source| MigrationError::Read { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY: &str = r#"{"up":[],"down":[]}"#;

    #[test]
    fn loads_sorted_and_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1750346145_updated_shorts.json"), EMPTY).unwrap();
        fs::write(dir.path().join("_1747732722_updated_playlists.json"), EMPTY).unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();
        fs::write(dir.path().join(".1_hidden.json"), EMPTY).unwrap();
        fs::create_dir(dir.path().join("2_nested.json")).unwrap();

        let set = load_dir(dir.path()).unwrap();
        let ids: Vec<_> = set.iter().map(|u| u.id.to_string()).collect();
        assert_eq!(ids, vec!["1747732722_updated_playlists", "1750346145_updated_shorts"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_dir(&dir.path().join("nonexistent")).unwrap().is_empty());
    }

    #[test]
    fn errors_name_the_offending_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1749449125_updated_songs.json"), "{ not json").unwrap();
        let err = load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("1749449125_updated_songs"));

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("updated_songs.json"), EMPTY).unwrap();
        assert!(matches!(load_dir(dir.path()), Err(MigrationError::InvalidId { .. })));
    }

    #[test]
    fn duplicate_ids_after_normalization_fail() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_init.json"), EMPTY).unwrap();
        fs::write(dir.path().join("_1_init.json"), EMPTY).unwrap();
        assert!(matches!(load_dir(dir.path()), Err(MigrationError::DuplicateId { .. })));
    }
}
