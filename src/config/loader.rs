//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/wise-tasks/)
    Project = 1,
    /// User-level config (~/.wise-tasks/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file; when set, the project and user tiers are skipped.
    pub explicit_file: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit_file = std::env::var("WISE_TASKS_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        // User dir: WISE_TASKS_USER_DIR or ~/.wise-tasks
        let user_dir = std::env::var("WISE_TASKS_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".wise-tasks")));

        // Project dir: WISE_TASKS_PROJECT_DIR or $CWD/wise-tasks
        let project_dir = std::env::var("WISE_TASKS_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("wise-tasks")));

        Self {
            explicit_file,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_file: None,
            project_dir,
            user_dir,
        }
    }

    /// Use a single config file instead of the project and user tiers.
    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }
}

/// Environment variable overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub db_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub token_secret: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("WISE_TASKS_DB_PATH").ok(),
            host: std::env::var("WISE_TASKS_HOST").ok(),
            port: std::env::var("WISE_TASKS_PORT").ok(),
            token_secret: std::env::var("WISE_TASKS_TOKEN_SECRET").ok(),
        }
    }

    fn apply(&self, config: &mut Config) {
        if let Some(db_path) = &self.db_path {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }

        if let Some(port) = &self.port {
            match port.parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid WISE_TASKS_PORT"),
            }
        }

        if let Some(secret) = &self.token_secret
            && !secret.is_empty()
        {
            config.auth.token_secret = Some(secret.clone());
        }
    }
}

/// Read a YAML file as a JSON value for merging. Missing files yield `None`.
fn read_tier(path: &Path, tier: ConfigTier) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {} config {}", tier, path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {} config {}", tier, path.display()))?;
    debug!(%tier, path = %path.display(), "Loaded config tier");
    Ok(Some(value))
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Loaded configuration
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), EnvOverrides::from_env())
    }

    /// Load configuration with explicit paths and environment.
    pub fn load_with(paths: ConfigPaths, env: EnvOverrides) -> Result<Self> {
        let mut configs: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        if let Some(explicit) = &paths.explicit_file {
            // An explicit file must exist.
            if !explicit.exists() {
                anyhow::bail!("config file not found: {}", explicit.display());
            }
            if let Some(value) = read_tier(explicit, ConfigTier::Project)? {
                configs.push(value);
                sources.push(explicit.clone());
            }
        } else {
            // Tier 2: Project config
            if let Some(project_dir) = &paths.project_dir {
                let file = project_dir.join("config.yaml");
                if let Some(value) = read_tier(&file, ConfigTier::Project)? {
                    configs.push(value);
                    sources.push(file);
                }
            }

            // Tier 3: User config
            if let Some(user_dir) = &paths.user_dir {
                let file = user_dir.join("config.yaml");
                if let Some(value) = read_tier(&file, ConfigTier::User)? {
                    configs.push(value);
                    sources.push(file);
                }
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged).context("invalid configuration")?;

        // Tier 4: Environment variable overrides
        env.apply(&mut config);

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}
