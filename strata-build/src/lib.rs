//! Build-time embedding of strata migration files.
//!
//! Scans a migrations directory for `<timestamp>_<name>.json` units and
//! generates a function that returns them as a `strata::MigrationSet`, with every
//! file compiled into the binary through `include_str!`.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     strata_build::embed_migrations()
//!         .scan_path("migrations/")
//!         .output_file("src/generated/migrations.rs")
//!         .run()
//!         .expect("Failed to embed migrations");
//! }
//! ```
//!
//! Then, in the crate:
//!
//! ```ignore
//! mod generated;
//!
//! let runner = strata::MigrationRunner::new(generated::migrations()?);
//! ```

mod generator;
mod scanner;

pub use generator::MigrationEmbedder;
pub use scanner::MigrationFile;

/// Create a new embedder with default settings.
///
/// # Example
///
/// ```ignore
/// strata_build::embed_migrations()
///     .scan_path("pb_migrations/")
///     .fn_name("schema_migrations")
///     .run()
///     .expect("Failed to embed migrations");
/// ```
pub fn embed_migrations() -> MigrationEmbedder {
    MigrationEmbedder::new()
}
