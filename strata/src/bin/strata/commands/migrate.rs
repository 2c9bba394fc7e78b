use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use strata::errors::MigrationError;
use strata::migration::UnitBody;
use strata::{MigrationRunner, RunReport, load_dir};

use crate::backend::Backend;
use crate::commands::ExampleGroup;
use crate::context::ProjectContext;
use crate::output::OutputManager;
use crate::utils::migration_filename;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Author Migrations",
        commands: &["strata migrate create --name updated_songs   # Write an empty up/down unit"],
    },
    ExampleGroup {
        title: "Apply and Revert",
        commands: &[
            "strata migrate up                    # Apply every pending migration",
            "strata migrate up --dry-run          # List what would be applied",
            "strata migrate down                  # Revert the most recent migration",
            "strata migrate down --steps 3        # Revert the three most recent",
            "strata migrate status                # Applied / pending per migration",
        ],
    },
    ExampleGroup {
        title: "Recovery",
        commands: &[
            "strata migrate resolve 1749660000_update_song_playlists_permissions --applied",
            "strata migrate resolve 1749660000_update_song_playlists_permissions --rolled-back",
        ],
    },
];

#[derive(Subcommand)]
pub enum MigrateCommands {
    /// Write a new, empty migration file
    #[command(name = "create")]
    Create {
        /// Name for the migration (e.g., updated_songs)
        #[arg(short, long)]
        name: String,
    },

    /// Apply pending migrations in order
    #[command(name = "up")]
    Up {
        /// Show what would be applied without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Revert the most recently applied migrations
    #[command(name = "down")]
    Down {
        /// Number of migrations to revert
        #[arg(long, default_value_t = 1)]
        steps: usize,

        /// Show what would be reverted without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Show applied and pending migrations
    #[command(name = "status")]
    Status,

    /// Manually mark a migration as applied or rolled back
    #[command(name = "resolve")]
    Resolve {
        /// Migration id to resolve
        migration_id: String,

        /// Mark the migration as applied
        #[arg(long, conflicts_with = "rolled_back", required_unless_present = "rolled_back")]
        applied: bool,

        /// Mark the migration as rolled back
        #[arg(long, conflicts_with = "applied")]
        rolled_back: bool,
    },
}

pub async fn handle_migrate_commands(command: MigrateCommands, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;
    output.verbose(&format!("config: {}", ctx.config_path.display()));
    run_migrate_command(&ctx, command, output).await
}

async fn run_migrate_command(ctx: &ProjectContext, command: MigrateCommands, output: &OutputManager) -> Result<()> {
    match command {
        MigrateCommands::Create { name } => handle_create(&ctx.migrations_dir, &name, Utc::now(), output),
        MigrateCommands::Up { dry_run } => {
            let (runner, mut store) = open_runner(ctx, output).await?;
            handle_up(&runner, &mut store, dry_run, output).await
        }
        MigrateCommands::Down { steps, dry_run } => {
            let (runner, mut store) = open_runner(ctx, output).await?;
            handle_down(&runner, &mut store, steps, dry_run, output).await
        }
        MigrateCommands::Status => {
            let (runner, mut store) = open_runner(ctx, output).await?;
            handle_status(&runner, &mut store, output).await
        }
        MigrateCommands::Resolve {
            migration_id,
            applied,
            rolled_back: _,
        } => {
            let (runner, mut store) = open_runner(ctx, output).await?;
            handle_resolve(&runner, &mut store, &migration_id, applied, output).await
        }
    }
}

/// Loads the migrations directory and opens the configured store.
async fn open_runner(ctx: &ProjectContext, output: &OutputManager) -> Result<(MigrationRunner, Backend)> {
    let set = load_dir(&ctx.migrations_dir)
        .with_context(|| format!("Failed to load migrations from {}", ctx.migrations_dir.display()))?;
    output.verbose(&format!("{} migration(s) in {}", set.len(), ctx.migrations_dir.display()));
    let store = Backend::open(ctx, output).await?;
    output.verbose(&format!("store: {}", store.describe()));
    Ok((MigrationRunner::new(set), store))
}

async fn handle_status(runner: &MigrationRunner, store: &mut Backend, output: &OutputManager) -> Result<()> {
    let report = runner.status(store).await?;
    output.heading("Migration Status");
    output.display(&report)?;
    if report.migrations.iter().any(|m| m.checksum_mismatch) {
        output.warning("Some applied migrations were edited after they ran");
    }
    if !report.orphaned.is_empty() {
        output.warning(&format!(
            "{} ledger record(s) have no migration file",
            report.orphaned.len()
        ));
    }
    Ok(())
}

fn handle_create(migrations_dir: &Path, name: &str, now: DateTime<Utc>, output: &OutputManager) -> Result<()> {
    let path = create_migration_file(migrations_dir, name, now)?;
    output.success(&format!("Created: {}", path.display()));
    output.info("Fill in the up and down steps, then run 'strata migrate up'");
    Ok(())
}

fn create_migration_file(migrations_dir: &Path, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    std::fs::create_dir_all(migrations_dir).context("Failed to create migrations directory")?;

    let path = migrations_dir.join(migration_filename(name, now));
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    let body = UnitBody {
        description: Some(name.to_string()),
        ..UnitBody::default()
    };
    let json = serde_json::to_string_pretty(&body).context("Failed to serialize migration")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write migration: {}", path.display()))?;
    Ok(path)
}

async fn handle_up(runner: &MigrationRunner, store: &mut Backend, dry_run: bool, output: &OutputManager) -> Result<()> {
    output.heading("Apply Migrations");

    if dry_run {
        let pending = runner.plan_up(store).await?;
        report_plan(&pending, "applied", output);
        return Ok(());
    }

    let result = runner.up(store).await;
    finish_run(result, "applied", output)
}

async fn handle_down(
    runner: &MigrationRunner,
    store: &mut Backend,
    steps: usize,
    dry_run: bool,
    output: &OutputManager,
) -> Result<()> {
    output.heading("Revert Migrations");

    if dry_run {
        let targets = runner.plan_down(store, steps).await?;
        report_plan(&targets, "reverted", output);
        return Ok(());
    }

    let result = runner.down(store, steps).await;
    finish_run(result, "reverted", output)
}

fn report_plan(ids: &[String], verb: &str, output: &OutputManager) {
    output.warning("DRY RUN MODE - No changes will be made");
    if ids.is_empty() {
        output.success("Nothing to do");
        return;
    }
    output.info(&format!("{} migration(s) would be {verb}:", ids.len()));
    for id in ids {
        output.bullet(id);
    }
}

fn finish_run(result: Result<RunReport, MigrationError>, verb: &str, output: &OutputManager) -> Result<()> {
    match result {
        Ok(report) => {
            if report.processed.is_empty() {
                output.success("Nothing to do, all migrations are up to date");
            } else {
                output.display(&report)?;
                output.success(&format!(
                    "{} migration(s) {verb} in {}ms",
                    report.processed.len(),
                    report.elapsed_ms
                ));
            }
            if report.skipped > 0 {
                output.info(&format!("{} migration(s) left unchanged", report.skipped));
            }
            Ok(())
        }
        Err(err) => {
            if let MigrationError::Failed { id, completed, .. } = &err {
                for done in completed {
                    output.bullet(&format!("{done} {verb}"));
                }
                output.error(&format!("Migration '{id}' failed"));
            }
            Err(err.into())
        }
    }
}

async fn handle_resolve(
    runner: &MigrationRunner,
    store: &mut Backend,
    migration_id: &str,
    applied: bool,
    output: &OutputManager,
) -> Result<()> {
    output.heading(&format!("Resolve Migration: {migration_id}"));

    if applied {
        if runner.mark_applied(store, migration_id).await? {
            output.success(&format!("Marked '{migration_id}' as applied"));
        } else {
            output.warning(&format!("Migration '{migration_id}' is already marked as applied"));
        }
    } else if runner.mark_rolled_back(store, migration_id).await? {
        output.success(&format!("Marked '{migration_id}' as rolled back"));
    } else {
        output.warning(&format!("Migration '{migration_id}' is not marked as applied"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GlobalOptions;
    use strata::MigrationSet;
    use tempfile::TempDir;

    #[test]
    fn created_file_loads_as_empty_unit() {
        let dir = TempDir::new().unwrap();
        let now = DateTime::<Utc>::from_timestamp(1_750_361_853, 0).unwrap();
        let path = create_migration_file(dir.path(), "updated shorts", now).unwrap();
        assert_eq!(path.file_name().unwrap(), "1750361853_updated_shorts.json");

        let set: MigrationSet = load_dir(dir.path()).unwrap();
        let unit = set.get("1750361853_updated_shorts").unwrap();
        assert!(unit.up.is_empty());
        assert!(unit.down.is_empty());
        assert_eq!(unit.description.as_deref(), Some("updated shorts"));
    }

    #[tokio::test]
    async fn create_does_not_load_existing_migrations() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(crate::context::CONFIG_FILE), "[strata]\nmigrations_dir = \"migrations\"\n").unwrap();
        std::fs::create_dir(dir.path().join("migrations")).unwrap();
        std::fs::write(dir.path().join("migrations/notes.json"), "{}").unwrap();
        let ctx = ProjectContext::from_root(dir.path().to_path_buf()).unwrap();
        let output = OutputManager::new(GlobalOptions {
            quiet: true,
            ..Default::default()
        });

        let create = MigrateCommands::Create {
            name: "updated_mix".to_string(),
        };
        run_migrate_command(&ctx, create, &output).await.unwrap();
        let created = std::fs::read_dir(dir.path().join("migrations")).unwrap().count();
        assert_eq!(created, 2);

        let status = run_migrate_command(&ctx, MigrateCommands::Status, &output).await;
        assert!(status.is_err());
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let now = DateTime::<Utc>::from_timestamp(1_750_361_853, 0).unwrap();
        create_migration_file(dir.path(), "updated_shorts", now).unwrap();
        assert!(create_migration_file(dir.path(), "updated_shorts", now).is_err());
    }
}
