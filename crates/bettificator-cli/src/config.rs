//! Configuration loading: defaults, TOML file, then environment

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bettificator_core::{DEFAULT_WORKERS, Target};
use bettificator_source::SourceConfig;
use bettificator_store::{DatabaseConfig, DatabaseKind};
use serde::Deserialize;

/// Global configuration for bettificator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSection,
    pub source: SourceSection,
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseSection::default(),
            source: SourceSection::default(),
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// `duckdb` or `postgres`
    pub kind: String,
    #[serde(deserialize_with = "deserialize_expanded")]
    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_expanded")]
    pub user: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub password: Option<String>,
    #[serde(deserialize_with = "deserialize_expanded")]
    pub name: String,
    pub table: String,
    /// Falls back to `table` when unset
    pub clubs_table: Option<String>,
    pub dir: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            kind: db.kind.to_string(),
            host: db.host,
            port: db.port,
            user: db.user,
            password: db.password,
            name: db.name,
            table: "test".to_string(),
            clubs_table: None,
            dir: db.dir,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    #[serde(deserialize_with = "deserialize_expanded")]
    pub base_url: String,
    pub matches_path: String,
    pub clubs_path: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        let source = SourceConfig::default();
        Self {
            base_url: source.base_url,
            matches_path: source.matches_path,
            clubs_path: source.clubs_path,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Like [`deserialize_env_var`] for required values: an unset variable is an error
fn deserialize_expanded<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    expand_env_var(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("environment variable in {s} is not set")))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./bettificator.toml (current directory)
    /// 2. ~/.config/bettificator/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("bettificator.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "bettificator") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// File (explicit or discovered) overlaid with the process environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override values from `DB_*` and `SOURCE_BASE_URL` variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let db = &mut self.database;
        if let Some(v) = lookup("DB_TYPE") {
            db.kind = v;
        }
        if let Some(v) = lookup("DB_HOST") {
            db.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            db.port = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid DB_PORT: {v}"))?;
        }
        if let Some(v) = lookup("DB_USER") {
            db.user = v;
        }
        if let Some(v) = lookup("DB_PASS") {
            db.password = Some(v).filter(|p| !p.is_empty());
        }
        if let Some(v) = lookup("DB_NAME") {
            db.name = v;
        }
        if let Some(v) = lookup("DB_TABLE") {
            db.table = v;
        }
        if let Some(v) = lookup("DB_CLUBS_TABLE") {
            db.clubs_table = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = lookup("DB_DIR") {
            db.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOURCE_BASE_URL") {
            self.source.base_url = v;
        }
        Ok(())
    }

    pub fn database_config(&self) -> Result<DatabaseConfig> {
        let db = &self.database;
        let kind: DatabaseKind = db.kind.parse()?;
        Ok(DatabaseConfig {
            kind,
            host: db.host.clone(),
            port: db.port,
            user: db.user.clone(),
            password: db.password.clone(),
            name: db.name.clone(),
            dir: db.dir.clone(),
        })
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            base_url: self.source.base_url.clone(),
            matches_path: self.source.matches_path.clone(),
            clubs_path: self.source.clubs_path.clone(),
        }
    }

    pub fn matches_target(&self) -> Target {
        Target::new(&self.database.name, &self.database.table)
    }

    pub fn clubs_target(&self) -> Target {
        let table = self
            .database
            .clubs_table
            .as_deref()
            .unwrap_or(&self.database.table);
        Target::new(&self.database.name, table)
    }
}
