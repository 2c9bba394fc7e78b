use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::commands::ExampleGroup;
use crate::context::{BackendKind, CONFIG_FILE, StrataConfig};
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Initialize",
    commands: &[
        "strata init                              # File store under .strata/data",
        "strata init --backend redis              # Store schemas in Redis (REDIS_URL)",
        "strata init --migrations-dir pb_migrations",
    ],
}];

#[derive(Args)]
pub struct InitArgs {
    /// Directory holding migration files, relative to the project root
    #[arg(long, default_value = "migrations")]
    pub migrations_dir: String,

    /// Schema store backend
    #[arg(long, value_enum, default_value = "file")]
    pub backend: BackendArg,

    /// Overwrite an existing strata.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum BackendArg {
    File,
    Redis,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => BackendKind::File,
            BackendArg::Redis => BackendKind::Redis,
        }
    }
}

pub async fn handle_init(args: InitArgs, output: &OutputManager) -> Result<()> {
    let root = std::env::current_dir().context("Failed to get current directory")?;
    output.heading("Initialize strata");
    init_project(&root, args, output)
}

fn init_project(root: &Path, args: InitArgs, output: &OutputManager) -> Result<()> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        output.warning(&format!("{CONFIG_FILE} already exists (use --force to overwrite)"));
        return Ok(());
    }

    let mut config = StrataConfig::default();
    config.strata.migrations_dir = args.migrations_dir;
    config.store.backend = args.backend.into();

    let body = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    std::fs::write(&config_path, body).with_context(|| format!("Failed to write {}", config_path.display()))?;
    output.success(&format!("Created {CONFIG_FILE}"));

    let migrations_dir = root.join(&config.strata.migrations_dir);
    std::fs::create_dir_all(&migrations_dir)
        .with_context(|| format!("Failed to create {}", migrations_dir.display()))?;
    output.success(&format!("Created {}/", config.strata.migrations_dir));

    output.info("Next steps:");
    output.bullet("strata migrate create --name init");
    output.bullet("strata migrate up");
    Ok(())
}
