use nanoid::nanoid;

/// Generated schema ids are a type prefix followed by decimal digits.
const SCHEMA_ID_ALPHABET: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
/// Digits appended to generated field and collection ids.
const SCHEMA_ID_DIGITS: usize = 10;
const COLLECTION_ID_PREFIX: &str = "pbc_";

/// Generates a field id such as `json3136074139` for a field of the given type.
pub fn generate_field_id(type_name: &str) -> String {
    format!("{type_name}{}", nanoid!(SCHEMA_ID_DIGITS, SCHEMA_ID_ALPHABET))
}

/// Generates a collection id such as `pbc_1906970480`.
pub fn generate_collection_id() -> String {
    format!("{COLLECTION_ID_PREFIX}{}", nanoid!(SCHEMA_ID_DIGITS, SCHEMA_ID_ALPHABET))
}
