//! Migration units: ids, declarative steps, files and the ordered set.

pub mod checksum;
pub mod id;
pub mod loader;
pub mod set;
pub mod step;
pub mod unit;

pub use checksum::calculate_checksum;
pub use id::{MigrationId, compare_ids};
pub use loader::load_dir;
pub use set::MigrationSet;
pub use step::{Change, Step, Transform};
pub use unit::{MigrationUnit, UnitBody};
