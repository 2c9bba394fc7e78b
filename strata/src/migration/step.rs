use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, ValidationError};
use crate::id::generate_collection_id;
use crate::schema::{CollectionPatch, CollectionSchema, FieldDef};
use crate::store::SchemaStore;

/// One edit applied to a collection that is already loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Change {
    /// Inserts (or moves, when the id exists) a field at `index`.
    AddField { index: usize, field: FieldDef },
    RemoveField { id: String },
    UpdateField { id: String, field: FieldDef },
    /// Overlays collection metadata: name and access rules.
    Patch { patch: CollectionPatch },
}

impl Change {
    pub fn apply(&self, collection: &mut CollectionSchema) -> Result<(), StoreError> {
        match self {
            Change::AddField { index, field } => collection.fields.add_at(*index, field.clone()),
            Change::RemoveField { id } => {
                collection.fields.remove_by_id(id)?;
            }
            Change::UpdateField { id, field } => collection.fields.update_by_id(id, field.clone())?,
            Change::Patch { patch } => patch.apply_to(collection)?,
        }
        Ok(())
    }
}

/// A single schema-store operation within a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Find the collection, apply every change in order, save once.
    UpdateCollection { collection: String, changes: Vec<Change> },
    CreateCollection { collection: CollectionSchema },
    DeleteCollection { collection: String },
}

impl Step {
    pub fn update(collection: impl Into<String>, changes: Vec<Change>) -> Self {
        Step::UpdateCollection {
            collection: collection.into(),
            changes,
        }
    }

    /// Collection name or id this step targets.
    pub fn target(&self) -> &str {
        match self {
            Step::UpdateCollection { collection, .. } | Step::DeleteCollection { collection } => collection,
            Step::CreateCollection { collection } => &collection.name,
        }
    }

    pub async fn apply<S: SchemaStore>(&self, store: &mut S) -> Result<(), StoreError> {
        match self {
            Step::UpdateCollection { collection, changes } => {
                let mut schema = store.find_collection(collection).await?;
                for change in changes {
                    change.apply(&mut schema)?;
                }
                store.save_collection(&schema).await
            }
            Step::CreateCollection { collection } => {
                let mut schema = collection.clone();
                if schema.id.is_empty() {
                    schema.id = generate_collection_id();
                }
                schema.fields.fill_missing_ids();
                let existing = store.list_collections().await?;
                if existing.iter().any(|other| other.id == schema.id) {
                    return Err(ValidationError::single(
                        "id",
                        "not_unique",
                        format!("collection '{}' already exists", schema.id),
                    )
                    .into());
                }
                store.save_collection(&schema).await
            }
            Step::DeleteCollection { collection } => {
                let schema = store.find_collection(collection).await?;
                store.delete_collection(&schema.id).await
            }
        }
    }
}

/// Ordered list of steps run against one store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transform(pub Vec<Step>);

impl Transform {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Runs each step in order and stops at the first failure.
    pub async fn apply<S: SchemaStore>(&self, store: &mut S) -> Result<(), StoreError> {
        for (index, step) in self.0.iter().enumerate() {
            debug!("step {} of {}: {}", index + 1, self.0.len(), step.target());
            step.apply(store).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn playlists() -> MemoryStore {
        MemoryStore::new().with_collection(
            CollectionSchema::new("pbc_976091127", "playlists")
                .with_field(FieldDef::text("title").with_id("text724990059")),
        )
    }

    #[test]
    fn parses_update_step_from_json() {
        let step: Step = serde_json::from_value(json!({
            "op": "update_collection",
            "collection": "pbc_2234858796",
            "changes": [
                { "action": "patch", "patch": { "name": "recent_plays" } },
                { "action": "remove_field", "id": "relation2229126836" }
            ]
        }))
        .unwrap();

        let Step::UpdateCollection { collection, changes } = step else {
            panic!("expected update step");
        };
        assert_eq!(collection, "pbc_2234858796");
        assert_eq!(changes.len(), 2);
        assert!(matches!(&changes[0], Change::Patch { patch } if patch.name.as_deref() == Some("recent_plays")));
    }

    #[tokio::test]
    async fn update_applies_changes_then_saves_once() {
        let mut store = playlists();
        let step = Step::update(
            "playlists",
            vec![
                Change::AddField {
                    index: 5,
                    field: FieldDef::json("songs").with_id("json3136074139"),
                },
                Change::RemoveField {
                    id: "text724990059".to_string(),
                },
            ],
        );
        step.apply(&mut store).await.unwrap();

        let saved = store.collection("pbc_976091127").unwrap();
        assert_eq!(saved.fields.len(), 1);
        assert!(saved.fields.get_by_id("json3136074139").is_some());
    }

    #[tokio::test]
    async fn failing_change_leaves_store_untouched() {
        let mut store = playlists();
        let step = Step::update(
            "playlists",
            vec![
                Change::AddField {
                    index: 0,
                    field: FieldDef::json("songs").with_id("json3136074139"),
                },
                Change::RemoveField {
                    id: "missing".to_string(),
                },
            ],
        );
        let err = step.apply(&mut store).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.collection("playlists").unwrap().fields.get_by_id("json3136074139").is_none());
    }

    #[tokio::test]
    async fn create_generates_id_and_rejects_existing() {
        let mut store = MemoryStore::new();
        let create = Step::CreateCollection {
            collection: CollectionSchema::new("", "shorts"),
        };
        create.apply(&mut store).await.unwrap();
        assert!(store.collection("shorts").unwrap().id.starts_with("pbc_"));

        let err = create.apply(&mut store).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_unknown_keys() {
        let misspelled_change = serde_json::from_value::<Change>(json!({
            "action": "remove_field",
            "id": "relation2229126836",
            "cascade": true
        }));
        assert!(misspelled_change.is_err());

        let extra_step_key = serde_json::from_value::<Step>(json!({
            "op": "update_collection",
            "collection": "pbc_2234858796",
            "changes": [],
            "typo": 1
        }));
        assert!(extra_step_key.is_err());
    }

    #[tokio::test]
    async fn create_from_json_fills_missing_field_ids() {
        let mut store = MemoryStore::new();
        let create: Step = serde_json::from_value(json!({
            "op": "create_collection",
            "collection": {
                "name": "mix",
                "fields": [
                    { "name": "title", "type": "text" },
                    { "id": "bool1", "name": "completed", "type": "bool" }
                ]
            }
        }))
        .unwrap();
        create.apply(&mut store).await.unwrap();

        let mix = store.collection("mix").unwrap();
        assert!(mix.fields.get_by_name("title").unwrap().id.starts_with("text"));
        assert_eq!(mix.fields.get_by_name("completed").unwrap().id, "bool1");
    }

    #[tokio::test]
    async fn delete_resolves_by_name() {
        let mut store = playlists();
        Step::DeleteCollection {
            collection: "Playlists".to_string(),
        }
        .apply(&mut store)
        .await
        .unwrap();
        assert!(store.collection("pbc_976091127").is_none());
    }
}
