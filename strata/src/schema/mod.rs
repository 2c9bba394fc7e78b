//! Collection schema model: fields, collections, typed patches and the
//! validation every store runs before persisting a write.

pub mod collection;
pub mod field;
pub mod patch;
pub mod validate;

pub use collection::{CollectionRules, CollectionSchema, FieldList};
pub use field::{
    BoolOptions, DateOptions, FieldDef, FieldKind, FileOptions, JsonOptions, NumberOptions, RelationOptions,
    SelectOptions, TextOptions,
};
pub use patch::CollectionPatch;
pub use validate::validate_collection;
