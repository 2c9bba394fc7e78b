//! strata core library.
//!
//! Versioned, reversible schema migrations for collection-based backends: a
//! typed schema model, declarative migration units, pluggable stores and a
//! runner that keeps an applied-migration ledger.

pub mod errors;
pub mod id;
pub mod keys;
pub mod migration;
pub mod runner;
pub mod schema;
pub mod store;

pub use errors::*;
pub use migration::{Change, MigrationId, MigrationSet, MigrationUnit, Step, Transform, load_dir};
pub use runner::{MigrationRunner, MigrationState, MigrationStatus, RunReport, StatusReport};
pub use schema::{CollectionPatch, CollectionRules, CollectionSchema, FieldDef, FieldKind};
pub use store::{FileStore, MemoryStore, MigrationLedger, MigrationRecord, RedisStore, SchemaStore};

pub use redis;
pub use redis::aio::ConnectionManager;
