use redis::aio::ConnectionManager;

use crate::errors::{StoreError, ValidationError};
use crate::keys::KeyContext;
use crate::schema::CollectionSchema;
use crate::store::ledger::{LedgerDocument, MigrationRecord, sort_records};
use crate::store::{MigrationLedger, SchemaStore, check_save, lookup};

/// RedisJSON-backed store.
///
/// Collections live at `{prefix}:collection:{id}` with their ids indexed in the
/// set `{prefix}:collections`; the ledger is the document `{prefix}:_migrations`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    pub async fn connect(redis_url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix)
    }

    async fn get_collection(&mut self, id: &str) -> Result<Option<CollectionSchema>, StoreError> {
        let key = self.keys().collection(id);
        let raw: Option<String> = redis::cmd("JSON.GET").arg(&key).query_async(&mut self.conn).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn load_all(&mut self) -> Result<Vec<CollectionSchema>, StoreError> {
        let index = self.keys().collection_index();
        let mut ids: Vec<String> = redis::cmd("SMEMBERS").arg(&index).query_async(&mut self.conn).await?;
        ids.sort();

        let mut collections = Vec::with_capacity(ids.len());
        for id in ids {
            // The index can briefly outlive a document deleted by hand.
            if let Some(collection) = self.get_collection(&id).await? {
                collections.push(collection);
            }
        }
        Ok(collections)
    }

    async fn load_ledger(&mut self) -> Result<LedgerDocument, StoreError> {
        let key = self.keys().ledger();
        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(&key)
            .arg("$.applied")
            .query_async(&mut self.conn)
            .await?;

        // `$` paths answer with an array of matches.
        let applied = match raw {
            Some(json) => {
                let matches: Vec<Vec<MigrationRecord>> = serde_json::from_str(&json)?;
                matches.into_iter().next().unwrap_or_default()
            }
            None => Vec::new(),
        };
        Ok(LedgerDocument { applied })
    }
}

impl SchemaStore for RedisStore {
    async fn find_collection(&mut self, name_or_id: &str) -> Result<CollectionSchema, StoreError> {
        if let Some(collection) = self.get_collection(name_or_id).await? {
            return Ok(collection);
        }
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

        let keys = KeyContext::new(&self.prefix);
        let payload = serde_json::to_string(collection)?;
        let _: () = redis::pipe()
            .atomic()
            .cmd("JSON.SET")
            .arg(keys.collection(&collection.id))
            .arg("$")
            .arg(payload)
            .ignore()
            .cmd("SADD")
            .arg(keys.collection_index())
            .arg(&collection.id)
            .ignore()
            .query_async(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn delete_collection(&mut self, id: &str) -> Result<(), StoreError> {
        let keys = KeyContext::new(&self.prefix);
        let (deleted, _): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(keys.collection(id))
            .cmd("SREM")
            .arg(keys.collection_index())
            .arg(id)
            .query_async(&mut self.conn)
            .await?;
        if deleted == 0 {
            return Err(StoreError::collection_not_found(id));
        }
        Ok(())
    }
}

impl MigrationLedger for RedisStore {
    async fn applied(&mut self) -> Result<Vec<MigrationRecord>, StoreError> {
        let mut records = self.load_ledger().await?.applied;
        sort_records(&mut records);
        Ok(records)
    }

    async fn insert_record(&mut self, record: MigrationRecord) -> Result<(), StoreError> {
        let key = self.keys().ledger();
        if self.load_ledger().await?.contains(&record.id) {
            return Err(ValidationError::single("id", "not_unique", format!("'{}' is already recorded", record.id)).into());
        }

        let empty = serde_json::to_string(&LedgerDocument::default())?;
        let record_json = serde_json::to_string(&record)?;
        let _: () = redis::pipe()
            .atomic()
            .cmd("JSON.SET")
            .arg(&key)
            .arg("$")
            .arg(empty)
            .arg("NX")
            .ignore()
            .cmd("JSON.ARRAPPEND")
            .arg(&key)
            .arg("$.applied")
            .arg(record_json)
            .ignore()
            .query_async(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn remove_record(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(index) = self.load_ledger().await?.position(id) else {
            return Ok(false);
        };
        let key = self.keys().ledger();
        let _: () = redis::cmd("JSON.ARRPOP")
            .arg(&key)
            .arg("$.applied")
            .arg(index as i64)
            .query_async(&mut self.conn)
            .await?;
        Ok(true)
    }
}
