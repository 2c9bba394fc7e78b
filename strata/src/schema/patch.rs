use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::schema::collection::CollectionSchema;
use crate::schema::validate::collection_name_issues;

/// Typed partial update of collection metadata.
///
/// Each rule is a double option: an absent key leaves the rule alone,
/// `null` locks it, and a string replaces it. Keys outside this set are
/// rejected when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub list_rule: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub view_rule: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub create_rule: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CollectionPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets all five rules to the same value.
    pub fn all_rules(rule: Option<String>) -> Self {
        Self {
            list_rule: Some(rule.clone()),
            view_rule: Some(rule.clone()),
            create_rule: Some(rule.clone()),
            update_rule: Some(rule.clone()),
            delete_rule: Some(rule),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.list_rule.is_none()
            && self.view_rule.is_none()
            && self.create_rule.is_none()
            && self.update_rule.is_none()
            && self.delete_rule.is_none()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if self.is_empty() {
            return Err(ValidationError::single("patch", "empty", "patch does not change anything"));
        }
        match &self.name {
            Some(name) => ValidationError::check(collection_name_issues("name", name, false)),
            None => Ok(()),
        }
    }

    /// Validates the patch, then overlays it onto `collection`.
    pub fn apply_to(&self, collection: &mut CollectionSchema) -> ValidationResult<()> {
        self.validate()?;

        if let Some(name) = &self.name {
            collection.name = name.clone();
        }
        let rules = &mut collection.rules;
        for (slot, value) in [
            (&mut rules.list_rule, &self.list_rule),
            (&mut rules.view_rule, &self.view_rule),
            (&mut rules.create_rule, &self.create_rule),
            (&mut rules.update_rule, &self.update_rule),
            (&mut rules.delete_rule, &self.delete_rule),
        ] {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        Ok(())
    }
}
