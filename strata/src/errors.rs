use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Kind of object a lookup was addressed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Collection,
    Field,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Collection => f.write_str("collection"),
            ObjectKind::Field => f.write_str("field"),
        }
    }
}

/// Errors raised by a schema store or by schema edits applied on its behalf.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A collection or field addressed by name/id does not exist.
    #[error("{kind} not found: {key}")]
    NotFound { kind: ObjectKind, key: String },

    /// The store rejected the write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Filesystem persistence failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl StoreError {
    pub fn collection_not_found(key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: ObjectKind::Collection,
            key: key.into(),
        }
    }

    pub fn field_not_found(key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: ObjectKind::Field,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Collection of validation issues found while checking a schema write.
#[derive(Debug, Clone, Error)]
#[error("validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-issue validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    /// Turns a list of issues into `Ok(())` when empty.
    pub fn check(issues: Vec<ValidationIssue>) -> ValidationResult<()> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self::new(issues))
        }
    }
}

/// A single rejected attribute, addressed by a dotted path such as `fields.songs.max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Direction a migration unit is being executed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Errors raised while loading migration units or running them.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("invalid migration id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("duplicate migration id '{id}'")]
    DuplicateId { id: String },

    #[error("failed to read migration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse migration '{id}': {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The ledger names a migration the current set does not contain.
    #[error("migration '{id}' is not part of the migration set")]
    UnknownMigration { id: String },

    /// A unit's transform (or its ledger write) failed; `completed` lists the
    /// units finished earlier in the same batch.
    #[error("migration '{id}' failed ({direction}): {source}")]
    Failed {
        id: String,
        direction: Direction,
        completed: Vec<String>,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MigrationError {
    /// The store error underneath this failure, if there is one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            MigrationError::Failed { source, .. } => Some(source),
            MigrationError::Store(source) => Some(source),
            _ => None,
        }
    }

    /// Id of the unit that failed, for batch failures.
    pub fn failed_id(&self) -> Option<&str> {
        match self {
            MigrationError::Failed { id, .. } => Some(id),
            _ => None,
        }
    }
}
