use crate::pipeline::DEFAULT_WORKERS;
use crate::shard::Sharder;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for respack runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of parser threads per stage
    pub workers: usize,

    /// Java package recorded in liteparse output
    pub package: String,

    /// How archive entries are assigned to shards
    pub sharder: ShardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    /// Sharding strategy: fnv
    pub strategy: String,

    /// Only the part of the key before the last separator is hashed
    pub separator: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            package: String::new(),
            sharder: ShardConfig::default(),
        }
    }
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            strategy: "fnv".to_string(),
            separator: None,
        }
    }
}

impl ShardConfig {
    /// Builds the configured sharder.
    pub fn sharder(&self) -> Result<Sharder> {
        let base = match self.strategy.as_str() {
            "fnv" => Sharder::fnv(),
            other => return Err(miette!("Unknown sharding strategy {:?} (expected \"fnv\")", other)),
        };
        Ok(match &self.separator {
            Some(separator) => Sharder::with_separator(separator.clone(), base),
            None => base,
        })
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(root: &Path) -> Result<Self> {
        let default_names = [".respack.yml", ".respack.yaml", ".respack.toml", "respack.toml"];

        for name in &default_names {
            let path = root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(miette!("workers must be at least 1"));
        }
        self.sharder.sharder().map(drop)
    }
}
