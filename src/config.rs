// src/config.rs

use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

fn default_table() -> String {
    "SP500".to_string()
}

/// Where one deployment environment keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionProfile {
    /// DuckDB database file.
    pub database: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default)]
    pub read_only: bool,
}

impl ConnectionProfile {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            table: default_table(),
            read_only: false,
        }
    }
}

/// Named connection profiles, loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub default_profile: Option<String>,
    pub profiles: BTreeMap<String, ConnectionProfile>,
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
        Ok(config)
    }

    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<&ConnectionProfile> {
        let name = name
            .or(self.default_profile.as_deref())
            .context("no profile requested and no default_profile configured")?;
        self.profiles.get(name).with_context(|| {
            format!(
                "unknown profile `{}` (available: {:?})",
                name,
                self.profiles.keys().collect::<Vec<_>>()
            )
        })
    }
}
