use serde::{Deserialize, Serialize};

/// A typed attribute of a collection.
///
/// The JSON shape matches the host platform's field object, with the kind
/// selected by the `"type"` key and its options flattened alongside the common
/// attributes:
///
/// ```text
/// { "id": "json3136074139", "name": "songs", "required": false, "type": "json", "maxSize": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Stable identifier; generated on insertion when empty.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub presentable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            hidden: false,
            presentable: false,
            required: false,
            system: false,
            kind,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text(TextOptions::default()))
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number(NumberOptions::default()))
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool(BoolOptions::default()))
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json(JsonOptions::default()))
    }

    pub fn relation(name: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Relation(RelationOptions {
                collection_id: collection_id.into(),
                max_select: 1,
                ..RelationOptions::default()
            }),
        )
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// Kind-specific constraints of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text(TextOptions),
    Number(NumberOptions),
    Bool(BoolOptions),
    Date(DateOptions),
    Select(SelectOptions),
    Relation(RelationOptions),
    File(FileOptions),
    Json(JsonOptions),
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::Number(_) => "number",
            FieldKind::Bool(_) => "bool",
            FieldKind::Date(_) => "date",
            FieldKind::Select(_) => "select",
            FieldKind::Relation(_) => "relation",
            FieldKind::File(_) => "file",
            FieldKind::Json(_) => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOptions {
    /// Minimum length, 0 for none.
    pub min: u32,
    /// Maximum length, 0 for unlimited.
    pub max: u32,
    pub pattern: String,
    pub autogenerate_pattern: String,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub only_int: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoolOptions {}

/// Date bounds; an empty string leaves that side unbounded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateOptions {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOptions {
    pub max_select: u32,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationOptions {
    pub collection_id: String,
    pub cascade_delete: bool,
    pub min_select: u32,
    pub max_select: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileOptions {
    pub max_select: u32,
    /// Bytes per file, 0 for the platform default.
    pub max_size: u64,
    pub mime_types: Vec<String>,
    pub thumbs: Vec<String>,
    pub protected: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonOptions {
    pub max_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_platform_file_field() {
        let raw = json!({
            "hidden": false,
            "id": "file3274582604",
            "maxSelect": 1,
            "maxSize": 10048576,
            "mimeTypes": [],
            "name": "audio_file",
            "presentable": false,
            "protected": false,
            "required": false,
            "system": false,
            "thumbs": [],
            "type": "file"
        });

        let field: FieldDef = serde_json::from_value(raw).unwrap();
        assert_eq!(field.id, "file3274582604");
        assert_eq!(field.name, "audio_file");
        match &field.kind {
            FieldKind::File(options) => {
                assert_eq!(options.max_select, 1);
                assert_eq!(options.max_size, 10_048_576);
                assert!(!options.protected);
            }
            other => panic!("expected file field, got {other:?}"),
        }
    }

    #[test]
    fn parses_nullable_number_bounds() {
        let raw = json!({
            "id": "number4113142680",
            "max": null,
            "min": 1,
            "name": "order",
            "onlyInt": false,
            "type": "number"
        });

        let field: FieldDef = serde_json::from_value(raw).unwrap();
        assert_eq!(
            field.kind,
            FieldKind::Number(NumberOptions {
                min: Some(1.0),
                max: None,
                only_int: false,
            })
        );
    }

    #[test]
    fn bool_field_carries_only_type_tag() {
        let field = FieldDef::bool("completed").with_id("bool989355118");
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "bool");
        assert_eq!(value["id"], "bool989355118");

        let back: FieldDef = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = json!({ "id": "geo1", "name": "location", "type": "geoPoint" });
        assert!(serde_json::from_value::<FieldDef>(raw).is_err());
    }

    #[test]
    fn select_values_keep_order() {
        let raw = json!({
            "id": "select2363381545",
            "maxSelect": 1,
            "name": "type",
            "required": true,
            "type": "select",
            "values": ["album", "artist", "playlist", "song"]
        });

        let field: FieldDef = serde_json::from_value(raw).unwrap();
        assert!(field.required);
        let FieldKind::Select(options) = field.kind else {
            panic!("expected select field");
        };
        assert_eq!(options.values, vec!["album", "artist", "playlist", "song"]);
    }
}
