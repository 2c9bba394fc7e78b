use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValidationError, ValidationIssue, ValidationResult};
use crate::schema::collection::CollectionSchema;
use crate::schema::field::{FieldDef, FieldKind};

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

const MAX_NAME_LENGTH: usize = 255;

/// Issues with a collection name. Names starting with `_` are reserved for
/// internal collections unless `allow_reserved` is set.
pub fn collection_name_issues(path: &str, name: &str, allow_reserved: bool) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if name.is_empty() {
        issues.push(ValidationIssue::new(path, "required", "name must not be empty"));
        return issues;
    }
    if name.len() > MAX_NAME_LENGTH {
        issues.push(ValidationIssue::new(
            path,
            "length",
            format!("name must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    if !NAME_PATTERN.is_match(name) {
        issues.push(ValidationIssue::new(
            path,
            "pattern",
            "name may only contain letters, digits and underscores",
        ));
    }
    if !allow_reserved && name.starts_with('_') {
        issues.push(ValidationIssue::new(path, "reserved", "names starting with '_' are reserved"));
    }
    issues
}

/// Checks a whole collection the way a store does before persisting it.
pub fn validate_collection(collection: &CollectionSchema) -> ValidationResult<()> {
    let mut issues = Vec::new();

    if collection.id.is_empty() {
        issues.push(ValidationIssue::new("id", "required", "collection id must not be empty"));
    } else if !NAME_PATTERN.is_match(&collection.id) {
        issues.push(ValidationIssue::new(
            "id",
            "pattern",
            "collection id may only contain letters, digits and underscores",
        ));
    }
    issues.extend(collection_name_issues("name", &collection.name, collection.system));

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    for field in &collection.fields {
        let path = format!("fields.{}", if field.name.is_empty() { &field.id } else { &field.name });

        if !field.id.is_empty() && !seen_ids.insert(field.id.as_str()) {
            issues.push(ValidationIssue::new(
                format!("{path}.id"),
                "not_unique",
                format!("duplicate field id '{}'", field.id),
            ));
        }
        if !field.name.is_empty() && !seen_names.insert(field.name.to_ascii_lowercase()) {
            issues.push(ValidationIssue::new(
                format!("{path}.name"),
                "not_unique",
                format!("duplicate field name '{}'", field.name),
            ));
        }
        field_issues(&path, field, &mut issues);
    }

    ValidationError::check(issues)
}

fn field_issues(path: &str, field: &FieldDef, issues: &mut Vec<ValidationIssue>) {
    if field.id.is_empty() {
        issues.push(ValidationIssue::new(format!("{path}.id"), "required", "field id must not be empty"));
    }
    if field.name.is_empty() {
        issues.push(ValidationIssue::new(format!("{path}.name"), "required", "field name must not be empty"));
    } else if !NAME_PATTERN.is_match(&field.name) {
        issues.push(ValidationIssue::new(
            format!("{path}.name"),
            "pattern",
            "field name may only contain letters, digits and underscores",
        ));
    }

    let mut push = |attr: &str, code: &str, message: String| {
        issues.push(ValidationIssue::new(format!("{path}.{attr}"), code, message));
    };

    match &field.kind {
        FieldKind::Text(options) => {
            if options.max > 0 && options.min > options.max {
                push("min", "range", format!("min {} exceeds max {}", options.min, options.max));
            }
            if !options.pattern.is_empty() && Regex::new(&options.pattern).is_err() {
                push("pattern", "invalid", format!("'{}' is not a valid regular expression", options.pattern));
            }
        }
        FieldKind::Number(options) => {
            if let (Some(min), Some(max)) = (options.min, options.max)
                && min > max
            {
                push("min", "range", format!("min {min} exceeds max {max}"));
            }
        }
        FieldKind::Bool(_) | FieldKind::Json(_) => {}
        FieldKind::Date(options) => {
            let min = parse_bound(&options.min);
            let max = parse_bound(&options.max);
            if let Err(raw) = &min {
                push("min", "invalid", format!("'{raw}' is not a datetime"));
            }
            if let Err(raw) = &max {
                push("max", "invalid", format!("'{raw}' is not a datetime"));
            }
            if let (Ok(Some(min)), Ok(Some(max))) = (min, max)
                && min > max
            {
                push("min", "range", "min date is after max date".to_string());
            }
        }
        FieldKind::Select(options) => {
            if options.values.is_empty() {
                push("values", "required", "select needs at least one value".to_string());
            }
            if options.max_select == 0 {
                push("maxSelect", "range", "maxSelect must be at least 1".to_string());
            }
            let mut seen = HashSet::new();
            for value in &options.values {
                if !seen.insert(value.as_str()) {
                    push("values", "not_unique", format!("duplicate select value '{value}'"));
                }
            }
        }
        FieldKind::Relation(options) => {
            if options.collection_id.is_empty() {
                push("collectionId", "required", "relation needs a target collection".to_string());
            }
            if options.max_select > 0 && options.min_select > options.max_select {
                push(
                    "minSelect",
                    "range",
                    format!("minSelect {} exceeds maxSelect {}", options.min_select, options.max_select),
                );
            }
        }
        FieldKind::File(options) => {
            if options.max_select == 0 {
                push("maxSelect", "range", "maxSelect must be at least 1".to_string());
            }
        }
    }
}

/// Parses a date bound; empty means unbounded. Accepts RFC 3339 and the
/// platform's `2006-01-02 15:04:05.000Z` layout.
fn parse_bound(raw: &str) -> Result<Option<DateTime<Utc>>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field::{DateOptions, NumberOptions, RelationOptions, SelectOptions, TextOptions};

    fn collection_with(field: FieldDef) -> CollectionSchema {
        CollectionSchema::new("pbc_674179655", "recent_plays").with_field(field)
    }

    fn codes(result: ValidationResult<()>) -> Vec<String> {
        result
            .unwrap_err()
            .issues
            .into_iter()
            .map(|issue| format!("{}:{}", issue.field, issue.code))
            .collect()
    }

    #[test]
    fn accepts_platform_shaped_collection() {
        let collection = CollectionSchema::new("pbc_674179655", "recent_plays")
            .with_field(FieldDef::relation("user_id", "_pb_users_auth_").with_id("relation2809058197"))
            .with_field(
                FieldDef::new(
                    "type",
                    FieldKind::Select(SelectOptions {
                        max_select: 1,
                        values: vec!["album".into(), "song".into()],
                    }),
                )
                .with_id("select2363381545"),
            )
            .with_field(
                FieldDef::new("last_played_at", FieldKind::Date(DateOptions::default())).with_id("date775272694"),
            );
        assert!(validate_collection(&collection).is_ok());
    }

    #[test]
    fn rejects_missing_id_and_bad_name() {
        let collection = CollectionSchema::new("", "recent plays");
        let codes = codes(validate_collection(&collection));
        assert!(codes.contains(&"id:required".to_string()));
        assert!(codes.contains(&"name:pattern".to_string()));
    }

    #[test]
    fn system_collections_may_use_reserved_names() {
        let mut collection = CollectionSchema::new("_pb_users_auth_", "_superusers");
        assert!(validate_collection(&collection).is_err());
        collection.system = true;
        assert!(validate_collection(&collection).is_ok());
    }

    #[test]
    fn rejects_duplicate_field_names_case_insensitively() {
        let collection = CollectionSchema::new("pbc_1", "songs")
            .with_field(FieldDef::text("title").with_id("text1"))
            .with_field(FieldDef::text("Title").with_id("text2"));
        assert_eq!(codes(validate_collection(&collection)), vec!["fields.Title.name:not_unique"]);
    }

    #[test]
    fn rejects_inverted_number_range() {
        let field = FieldDef::new(
            "order",
            FieldKind::Number(NumberOptions {
                min: Some(10.0),
                max: Some(1.0),
                only_int: true,
            }),
        )
        .with_id("number4113142680");
        assert_eq!(codes(validate_collection(&collection_with(field))), vec!["fields.order.min:range"]);
    }

    #[test]
    fn text_max_zero_means_unlimited() {
        let field = FieldDef::new(
            "lyrics",
            FieldKind::Text(TextOptions {
                min: 5,
                max: 0,
                ..TextOptions::default()
            }),
        )
        .with_id("text1004170342");
        assert!(validate_collection(&collection_with(field)).is_ok());
    }

    #[test]
    fn rejects_unparsable_and_inverted_dates() {
        let bad = FieldDef::new(
            "played",
            FieldKind::Date(DateOptions {
                min: "yesterday".into(),
                max: String::new(),
            }),
        )
        .with_id("date1");
        assert_eq!(codes(validate_collection(&collection_with(bad))), vec!["fields.played.min:invalid"]);

        let inverted = FieldDef::new(
            "played",
            FieldKind::Date(DateOptions {
                min: "2025-06-01 00:00:00.000Z".into(),
                max: "2025-01-01T00:00:00Z".into(),
            }),
        )
        .with_id("date1");
        assert_eq!(codes(validate_collection(&collection_with(inverted))), vec!["fields.played.min:range"]);
    }

    #[test]
    fn relation_needs_target() {
        let field = FieldDef::new("artist_id", FieldKind::Relation(RelationOptions::default())).with_id("relation1");
        assert_eq!(
            codes(validate_collection(&collection_with(field))),
            vec!["fields.artist_id.collectionId:required"]
        );
    }
}
