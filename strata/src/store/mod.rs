//! Schema stores and the applied-migration ledger.
//!
//! A store owns collection schemas; the ledger owns [`MigrationRecord`]s. The
//! runner needs both from the same handle so a unit's schema write and its
//! record land in the same backend.

pub mod file;
pub mod ledger;
pub mod memory;
pub mod redis;

pub use file::FileStore;
pub use ledger::{LedgerDocument, MigrationRecord};
pub use memory::MemoryStore;
pub use self::redis::RedisStore;

use crate::errors::{StoreError, ValidationError, ValidationIssue};
use crate::schema::{CollectionSchema, validate_collection};

/// Collection persistence used by migration transforms.
#[allow(async_fn_in_trait)]
pub trait SchemaStore {
    /// Looks a collection up by exact id, then by case-insensitive name.
    async fn find_collection(&mut self, name_or_id: &str) -> Result<CollectionSchema, StoreError>;

    async fn list_collections(&mut self) -> Result<Vec<CollectionSchema>, StoreError>;

    /// Validates and persists `collection`, creating or replacing it by id.
    async fn save_collection(&mut self, collection: &CollectionSchema) -> Result<(), StoreError>;

    async fn delete_collection(&mut self, id: &str) -> Result<(), StoreError>;
}

/// Record-keeping of which migration units have been applied.
#[allow(async_fn_in_trait)]
pub trait MigrationLedger {
    async fn applied(&mut self) -> Result<Vec<MigrationRecord>, StoreError>;

    async fn insert_record(&mut self, record: MigrationRecord) -> Result<(), StoreError>;

    /// Removes the record for `id`; `false` when there was none.
    async fn remove_record(&mut self, id: &str) -> Result<bool, StoreError>;
}

/// Resolves `name_or_id` against `collections`, preferring an exact id match.
pub(crate) fn lookup<'a, I>(collections: I, name_or_id: &str) -> Option<&'a CollectionSchema>
where
    I: IntoIterator<Item = &'a CollectionSchema> + Clone,
{
    collections
        .clone()
        .into_iter()
        .find(|collection| collection.id == name_or_id)
        .or_else(|| {
            collections
                .into_iter()
                .find(|collection| collection.name.eq_ignore_ascii_case(name_or_id))
        })
}

/// Runs schema validation plus the cross-collection name check every store
/// applies before a save. `others` may include the stored copy of `collection`
/// itself; it is skipped by id.
pub(crate) fn check_save<'a, I>(collection: &CollectionSchema, others: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = &'a CollectionSchema>,
{
    validate_collection(collection)?;
    let clash = others
        .into_iter()
        .filter(|other| other.id != collection.id)
        .any(|other| other.name.eq_ignore_ascii_case(&collection.name));
    if clash {
        return Err(ValidationError::new([ValidationIssue::new(
            "name",
            "not_unique",
            format!("a collection named '{}' already exists", collection.name),
        )])
        .into());
    }
    Ok(())
}
