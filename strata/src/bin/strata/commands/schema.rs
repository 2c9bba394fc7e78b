use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};
use serde::Serialize;
use strata::{CollectionSchema, FieldDef, FieldKind, SchemaStore};

use crate::backend::Backend;
use crate::commands::ExampleGroup;
use crate::context::ProjectContext;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Inspect Schema",
    commands: &[
        "strata schema show                   # List every collection",
        "strata schema show songs             # Fields of one collection (name or id)",
        "strata --output json schema show     # Machine-readable dump",
    ],
}];

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Show collections, or the fields of one collection
    #[command(name = "show")]
    Show {
        /// Collection name or id (optional, lists all if omitted)
        collection: Option<String>,
    },
}

pub async fn handle_schema_commands(command: SchemaCommands, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;
    let mut store = Backend::open(&ctx, output).await?;

    match command {
        SchemaCommands::Show { collection: None } => {
            let collections = CollectionList(store.list_collections().await?);
            output.heading("Collections");
            if collections.0.is_empty() {
                output.info("No collections yet");
                return Ok(());
            }
            output.display(&collections)
        }
        SchemaCommands::Show {
            collection: Some(name_or_id),
        } => {
            let collection = CollectionView(store.find_collection(&name_or_id).await?);
            output.heading(&format!("{} ({})", collection.0.name, collection.0.id));
            let rules = &collection.0.rules;
            for (action, rule) in [
                ("list", &rules.list_rule),
                ("view", &rules.view_rule),
                ("create", &rules.create_rule),
                ("update", &rules.update_rule),
                ("delete", &rules.delete_rule),
            ] {
                output.key_value(action, &describe_rule(rule.as_deref()));
            }
            output.display(&collection)
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct CollectionList(Vec<CollectionSchema>);

#[derive(Serialize)]
#[serde(transparent)]
struct CollectionView(CollectionSchema);

impl TableDisplay for CollectionList {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["Id", "Name", "Fields", "System"]);
        for collection in &self.0 {
            table.add_row(vec![
                Cell::new(&collection.id),
                Cell::new(&collection.name),
                Cell::new(collection.fields.len()),
                Cell::new(if collection.system { "yes" } else { "" }),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0
            .iter()
            .map(|collection| collection.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl TableDisplay for CollectionView {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["#", "Id", "Name", "Type", "Required", "Options"]);
        for (index, field) in self.0.fields.iter().enumerate() {
            table.add_row(vec![
                Cell::new(index),
                Cell::new(&field.id),
                Cell::new(&field.name),
                Cell::new(field.type_name()),
                Cell::new(if field.required { "yes" } else { "" }),
                Cell::new(describe_options(field)),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let fields: Vec<String> = self
            .0
            .fields
            .iter()
            .map(|field| format!("{}:{}", field.name, field.type_name()))
            .collect();
        format!("{} {}", self.0.name, fields.join(","))
    }
}

fn describe_rule(rule: Option<&str>) -> String {
    match rule {
        None => "superusers only".to_string(),
        Some("") => "public".to_string(),
        Some(filter) => filter.to_string(),
    }
}

/// Short summary of the kind-specific options worth seeing at a glance.
fn describe_options(field: &FieldDef) -> String {
    match &field.kind {
        FieldKind::Text(options) if options.max > 0 => format!("length {}..{}", options.min, options.max),
        FieldKind::Text(options) if !options.pattern.is_empty() => format!("pattern {}", options.pattern),
        FieldKind::Number(options) => match (options.min, options.max) {
            (None, None) if options.only_int => "integer".to_string(),
            (min, max) => format!(
                "{}..{}",
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            ),
        },
        FieldKind::Select(options) => format!("{} (max {})", options.values.join("|"), options.max_select),
        FieldKind::Relation(options) => {
            let cascade = if options.cascade_delete { ", cascade" } else { "" };
            format!("-> {} (max {}{cascade})", options.collection_id, options.max_select)
        }
        FieldKind::File(options) if options.max_size > 0 => {
            format!("max {} file(s), {} bytes", options.max_select, options.max_size)
        }
        FieldKind::File(options) => format!("max {} file(s)", options.max_select),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata::schema::{NumberOptions, SelectOptions};

    #[test]
    fn describes_relation_and_select() {
        let relation = FieldDef::relation("artist_id", "pbc_1275757432");
        assert_eq!(describe_options(&relation), "-> pbc_1275757432 (max 1)");

        let select = FieldDef::new(
            "type",
            FieldKind::Select(SelectOptions {
                max_select: 1,
                values: vec!["album".into(), "song".into()],
            }),
        );
        assert_eq!(describe_options(&select), "album|song (max 1)");
    }

    #[test]
    fn describes_number_bounds() {
        let order = FieldDef::new(
            "order",
            FieldKind::Number(NumberOptions {
                min: Some(1.0),
                max: None,
                only_int: false,
            }),
        );
        assert_eq!(describe_options(&order), "1..");
        assert_eq!(describe_options(&FieldDef::bool("completed")), "");
    }

    #[test]
    fn describes_rules() {
        assert_eq!(describe_rule(None), "superusers only");
        assert_eq!(describe_rule(Some("")), "public");
        assert_eq!(describe_rule(Some("@request.auth.id != \"\"")), "@request.auth.id != \"\"");
    }

    #[test]
    fn compact_view_lists_fields() {
        let view = CollectionView(
            CollectionSchema::new("pbc_1", "songs")
                .with_field(FieldDef::text("title").with_id("text1"))
                .with_field(FieldDef::json("lyrics").with_id("json1")),
        );
        assert_eq!(view.to_compact(), "songs title:text,lyrics:json");
    }
}
