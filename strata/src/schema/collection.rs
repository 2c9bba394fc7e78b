use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::id::generate_field_id;
use crate::schema::field::FieldDef;

/// Access rules of a collection.
///
/// `None` locks the action to superusers; `Some("")` makes it public; any other
/// string is a filter expression evaluated by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionRules {
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

/// A named schema object holding access rules and an ordered field list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub system: bool,
    #[serde(flatten)]
    pub rules: CollectionRules,
    #[serde(default)]
    pub fields: FieldList,
}

impl CollectionSchema {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        let index = self.fields.len();
        self.fields.add_at(index, field);
        self
    }

    pub fn with_rules(mut self, rules: CollectionRules) -> Self {
        self.rules = rules;
        self
    }

    /// True when `key` addresses this collection by exact id or case-insensitive name.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.name.eq_ignore_ascii_case(key)
    }
}

/// Ordered field sequence; position is significant and fields are addressed by id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldList(Vec<FieldDef>);

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDef> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[FieldDef] {
        &self.0
    }

    pub fn get_by_id(&self, id: &str) -> Option<&FieldDef> {
        self.0.iter().find(|field| field.id == id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.0.iter().find(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|field| field.id == id)
    }

    /// Inserts `field` at `index` (clamped to the end of the list).
    ///
    /// A field that already carries the same id is taken out first, so adding
    /// an existing id replaces that field and moves it to `index`. An empty id
    /// is filled with a generated one.
    pub fn add_at(&mut self, index: usize, mut field: FieldDef) {
        if field.id.is_empty() {
            field.id = generate_field_id(field.type_name());
        } else if let Some(existing) = self.position(&field.id) {
            self.0.remove(existing);
        }
        let index = index.min(self.0.len());
        self.0.insert(index, field);
    }

    pub fn remove_by_id(&mut self, id: &str) -> Result<FieldDef, StoreError> {
        let position = self.position(id).ok_or_else(|| StoreError::field_not_found(id))?;
        Ok(self.0.remove(position))
    }

    /// Generates ids for fields that have none, e.g. after parsing a new collection.
    pub fn fill_missing_ids(&mut self) {
        for field in self.0.iter_mut().filter(|field| field.id.is_empty()) {
            field.id = generate_field_id(field.type_name());
        }
    }

    /// Replaces the field with `id` in place; the replacement keeps that id.
    pub fn update_by_id(&mut self, id: &str, mut field: FieldDef) -> Result<(), StoreError> {
        let position = self.position(id).ok_or_else(|| StoreError::field_not_found(id))?;
        field.id = id.to_string();
        self.0[position] = field;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a FieldDef;
    type IntoIter = std::slice::Iter<'a, FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<FieldDef> for FieldList {
    fn from_iter<I: IntoIterator<Item = FieldDef>>(iter: I) -> Self {
        let mut list = FieldList::new();
        for field in iter {
            let index = list.len();
            list.add_at(index, field);
        }
        list
    }
}
