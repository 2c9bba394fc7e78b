use serde::{Deserialize, Serialize};

use crate::errors::{Direction, MigrationError};
use crate::migration::checksum::calculate_checksum;
use crate::migration::id::MigrationId;
use crate::migration::step::Transform;

/// On-disk body of a migration file. The id comes from the file name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub up: Transform,
    pub down: Transform,
}

/// A versioned, reversible schema change.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationUnit {
    pub id: MigrationId,
    pub description: Option<String>,
    pub up: Transform,
    pub down: Transform,
    pub checksum: String,
}

impl MigrationUnit {
    /// Builds a unit in code; the checksum covers its canonical JSON form.
    pub fn new(id: MigrationId, up: Transform, down: Transform) -> Self {
        let body = UnitBody {
            description: None,
            up,
            down,
        };
        let checksum = canonical_checksum(&body);
        Self::from_body(id, body, checksum)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parses a migration file; the checksum covers the exact source text.
    pub fn parse(id: MigrationId, source: &str) -> Result<Self, MigrationError> {
        let body: UnitBody = serde_json::from_str(source).map_err(|source| MigrationError::Parse {
            id: id.to_string(),
            source,
        })?;
        Ok(Self::from_body(id, body, calculate_checksum(source)))
    }

    fn from_body(id: MigrationId, body: UnitBody, checksum: String) -> Self {
        Self {
            id,
            description: body.description,
            up: body.up,
            down: body.down,
            checksum,
        }
    }

    pub fn transform(&self, direction: Direction) -> &Transform {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    pub fn to_body(&self) -> UnitBody {
        UnitBody {
            description: self.description.clone(),
            up: self.up.clone(),
            down: self.down.clone(),
        }
    }
}

fn canonical_checksum(body: &UnitBody) -> String {
    // Serializing plain structs and vectors cannot fail.
    let canonical = serde_json::to_string(body).unwrap_or_default();
    calculate_checksum(&canonical)
}
