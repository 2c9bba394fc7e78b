use chrono::{DateTime, Utc};

/// Format a DateTime to a human-readable string
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Migration file name for `name`, prefixed with the unix timestamp of `now`.
pub fn migration_filename(name: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.json", now.timestamp(), sanitize_identifier(name))
}

/// Lowercases and replaces anything outside `[a-z0-9_]` with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
