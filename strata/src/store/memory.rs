use std::collections::BTreeMap;

use crate::errors::{StoreError, ValidationError};
use crate::id::generate_collection_id;
use crate::schema::CollectionSchema;
use crate::store::ledger::{LedgerDocument, MigrationRecord};
use crate::store::{MigrationLedger, SchemaStore, check_save, lookup};

/// In-process store, used for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: BTreeMap<String, CollectionSchema>,
    ledger: LedgerDocument,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection without validation, generating an id when empty.
    pub fn with_collection(mut self, mut collection: CollectionSchema) -> Self {
        if collection.id.is_empty() {
            collection.id = generate_collection_id();
        }
        self.collections.insert(collection.id.clone(), collection);
        self
    }

    /// Current state of a collection by id or name.
    pub fn collection(&self, name_or_id: &str) -> Option<&CollectionSchema> {
        lookup(self.collections.values(), name_or_id)
    }

    pub fn records(&self) -> &[MigrationRecord] {
        &self.ledger.applied
    }
}

impl SchemaStore for MemoryStore {
    async fn find_collection(&mut self, name_or_id: &str) -> Result<CollectionSchema, StoreError> {
        self.collection(name_or_id)
            .cloned()
            .ok_or_else(|| StoreError::collection_not_found(name_or_id))
    }

    async fn list_collections(&mut self) -> Result<Vec<CollectionSchema>, StoreError> {
        Ok(self.collections.values().cloned().collect())
    }

    async fn save_collection(&mut self, collection: &CollectionSchema) -> Result<(), StoreError> {
        check_save(collection, self.collections.values())?;
        self.collections.insert(collection.id.clone(), collection.clone());
        Ok(())
    }

    async fn delete_collection(&mut self, id: &str) -> Result<(), StoreError> {
        self.collections
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::collection_not_found(id))
    }
}

impl MigrationLedger for MemoryStore {
    async fn applied(&mut self) -> Result<Vec<MigrationRecord>, StoreError> {
        Ok(self.ledger.clone().sorted())
    }

    async fn insert_record(&mut self, record: MigrationRecord) -> Result<(), StoreError> {
        if self.ledger.contains(&record.id) {
            return Err(ValidationError::single("id", "not_unique", format!("'{}' is already recorded", record.id)).into());
        }
        self.ledger.applied.push(record);
        Ok(())
    }

    async fn remove_record(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.ledger.remove(id))
    }
}
