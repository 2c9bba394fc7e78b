use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "strata.toml";

/// Project context for strata operations
pub struct ProjectContext {
    /// Directory holding strata.toml
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub migrations_dir: PathBuf,
    pub config: StrataConfig,
}

/// Contents of strata.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub strata: StrataSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub redis: RedisSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrataSettings {
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
}

impl Default for StrataSettings {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
        }
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: BackendKind,
    /// Root of the file store, relative to the project root
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    ".strata/data".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            prefix: default_redis_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_redis_prefix() -> String {
    "strata".to_string()
}

impl ProjectContext {
    /// Find and load project context from current directory or ancestors
    pub fn find() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::find_from(&current_dir)
    }

    pub fn find_from(start: &Path) -> Result<Self> {
        let project_root = Self::find_project_root(start)?;
        Self::from_root(project_root)
    }

    pub fn from_root(project_root: PathBuf) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: StrataConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", config_path.display()))?;
        let migrations_dir = project_root.join(&config.strata.migrations_dir);

        Ok(Self {
            project_root,
            config_path,
            migrations_dir,
            config,
        })
    }

    /// Walks up from `start` to the first directory containing strata.toml.
    fn find_project_root(start: &Path) -> Result<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Ok(current);
            }
            if !current.pop() {
                anyhow::bail!(
                    "Could not find {CONFIG_FILE} in {} or any parent directory. Run 'strata init' first.",
                    start.display()
                );
            }
        }
    }

    /// File store root, resolved against the project root.
    pub fn data_dir(&self) -> Result<PathBuf> {
        Ok(self.project_root.join(expand_env(&self.config.store.data_dir)?))
    }

    /// The configured Redis URL with `${VAR}` references expanded.
    pub fn redis_url(&self) -> Result<String> {
        expand_env(&self.config.redis.url)
    }
}

/// Expands every `${VAR}` in `raw` from the environment.
pub fn expand_env(raw: &str) -> Result<String> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unterminated variable reference in '{raw}'"))?;
        let var_name = &after[..end];
        let value =
            std::env::var(var_name).with_context(|| format!("Environment variable {var_name} not set"))?;
        expanded.push_str(&value);
        rest = &after[end + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}
