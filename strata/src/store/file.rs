use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use crate::errors::{StoreError, ValidationError};
use crate::schema::CollectionSchema;
use crate::store::ledger::{LedgerDocument, MigrationRecord};
use crate::store::{MigrationLedger, SchemaStore, check_save, lookup};

const COLLECTIONS_DIR: &str = "collections";
const LEDGER_FILE: &str = "_migrations.json";

/// Directory-backed store:
///
/// ```text
/// <root>/collections/<id>.json
/// <root>/_migrations.json
/// ```
///
/// Every write goes to a sibling temp file first and is renamed into place, so
/// a crash never leaves a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (and creates, if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(COLLECTIONS_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, id: &str) -> PathBuf {
        self.root.join(COLLECTIONS_DIR).join(format!("{id}.json"))
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    async fn load_all(&self) -> Result<Vec<CollectionSchema>, StoreError> {
        let mut entries = fs::read_dir(self.root.join(COLLECTIONS_DIR)).await?;
        let mut collections = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let raw = fs::read_to_string(&path).await?;
                collections.push(serde_json::from_str(&raw)?);
            }
        }
        collections.sort_by(|a: &CollectionSchema, b| a.id.cmp(&b.id));
        Ok(collections)
    }

    async fn load_ledger(&self) -> Result<LedgerDocument, StoreError> {
        match fs::read_to_string(self.ledger_path()).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(LedgerDocument::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl SchemaStore for FileStore {
    async fn find_collection(&mut self, name_or_id: &str) -> Result<CollectionSchema, StoreError> {
        let collections = self.load_all().await?;
        lookup(&collections, name_or_id)
            .cloned()
            .ok_or_else(|| StoreError::collection_not_found(name_or_id))
    }

    async fn list_collections(&mut self) -> Result<Vec<CollectionSchema>, StoreError> {
        self.load_all().await
    }

    async fn save_collection(&mut self, collection: &CollectionSchema) -> Result<(), StoreError> {
        let existing = self.load_all().await?;
        check_save(collection, &existing)?;
        self.write_json(&self.collection_path(&collection.id), collection).await
    }

    async fn delete_collection(&mut self, id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.collection_path(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::collection_not_found(id)),
            Err(err) => Err(err.into()),
        }
    }
}

impl MigrationLedger for FileStore {
    async fn applied(&mut self) -> Result<Vec<MigrationRecord>, StoreError> {
        Ok(self.load_ledger().await?.sorted())
    }

    async fn insert_record(&mut self, record: MigrationRecord) -> Result<(), StoreError> {
        let mut ledger = self.load_ledger().await?;
        if ledger.contains(&record.id) {
            return Err(ValidationError::single("id", "not_unique", format!("'{}' is already recorded", record.id)).into());
        }
        ledger.applied.push(record);
        self.write_json(&self.ledger_path(), &ledger).await
    }

    async fn remove_record(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut ledger = self.load_ledger().await?;
        if !ledger.remove(id) {
            return Ok(false);
        }
        self.write_json(&self.ledger_path(), &ledger).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_creates_layout_and_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).await.unwrap();
        assert!(store.root().join(COLLECTIONS_DIR).is_dir());
        assert!(store.applied().await.unwrap().is_empty());
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_writes_one_document_per_collection() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).await.unwrap();
        store
            .save_collection(&CollectionSchema::new("pbc_976091127", "playlists"))
            .await
            .unwrap();

        let path = dir.path().join("collections/pbc_976091127.json");
        assert!(path.is_file());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(store.find_collection("playlists").await.unwrap().id, "pbc_976091127");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.delete_collection("pbc_1").await.unwrap_err().is_not_found());
    }
}
