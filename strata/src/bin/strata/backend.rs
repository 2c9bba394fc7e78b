//! Store selected by strata.toml.

use anyhow::{Context, Result};
use strata::errors::StoreError;
use strata::{CollectionSchema, FileStore, MigrationLedger, MigrationRecord, RedisStore, SchemaStore};

use crate::context::{BackendKind, ProjectContext};
use crate::output::OutputManager;

pub enum Backend {
    File(FileStore),
    Redis(RedisStore),
}

impl Backend {
    pub async fn open(ctx: &ProjectContext, output: &OutputManager) -> Result<Self> {
        match ctx.config.store.backend {
            BackendKind::File => {
                let root = ctx.data_dir()?;
                output.verbose(&format!("file store: {}", root.display()));
                let store = FileStore::open(&root)
                    .await
                    .with_context(|| format!("Failed to open file store at {}", root.display()))?;
                Ok(Backend::File(store))
            }
            BackendKind::Redis => {
                let redis_url = ctx.redis_url().context("REDIS_URL is required for the redis backend")?;
                output.verbose(&format!("redis store: {redis_url} (prefix '{}')", ctx.config.redis.prefix));
                let store = RedisStore::connect(&redis_url, ctx.config.redis.prefix.clone())
                    .await
                    .context("Failed to connect to Redis")?;
                Ok(Backend::Redis(store))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Backend::File(store) => format!("file ({})", store.root().display()),
            Backend::Redis(store) => format!("redis (prefix '{}')", store.prefix()),
        }
    }
}

impl SchemaStore for Backend {
    async fn find_collection(&mut self, name_or_id: &str) -> Result<CollectionSchema, StoreError> {
        match self {
            Backend::File(store) => store.find_collection(name_or_id).await,
            Backend::Redis(store) => store.find_collection(name_or_id).await,
        }
    }

    async fn list_collections(&mut self) -> Result<Vec<CollectionSchema>, StoreError> {
        match self {
            Backend::File(store) => store.list_collections().await,
            Backend::Redis(store) => store.list_collections().await,
        }
    }

    async fn save_collection(&mut self, collection: &CollectionSchema) -> Result<(), StoreError> {
        match self {
            Backend::File(store) => store.save_collection(collection).await,
            Backend::Redis(store) => store.save_collection(collection).await,
        }
    }

    async fn delete_collection(&mut self, id: &str) -> Result<(), StoreError> {
        match self {
            Backend::File(store) => store.delete_collection(id).await,
            Backend::Redis(store) => store.delete_collection(id).await,
        }
    }
}

impl MigrationLedger for Backend {
    async fn applied(&mut self) -> Result<Vec<MigrationRecord>, StoreError> {
        match self {
            Backend::File(store) => store.applied().await,
            Backend::Redis(store) => store.applied().await,
        }
    }

    async fn insert_record(&mut self, record: MigrationRecord) -> Result<(), StoreError> {
        match self {
            Backend::File(store) => store.insert_record(record).await,
            Backend::Redis(store) => store.insert_record(record).await,
        }
    }

    async fn remove_record(&mut self, id: &str) -> Result<bool, StoreError> {
        match self {
            Backend::File(store) => store.remove_record(id).await,
            Backend::Redis(store) => store.remove_record(id).await,
        }
    }
}
