//! Configuration loading and validation.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Families that never reach the emitted tables unless the config says otherwise.
pub const DEFAULT_EXCLUDED_FAMILIES: [u8; 2] = [18, 31];

/// Maximum size in bytes for the formula database (bound input size).
pub const MAX_DATABASE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactConfig {
    /// Family ids skipped entirely: no pool entries, no path row, no meta entry.
    /// [`DEFAULT_EXCLUDED_FAMILIES`] are always part of the list.
    #[serde(default = "default_excluded_families")]
    pub excluded_families: Vec<u8>,
    #[serde(default = "default_max_database_bytes")]
    pub max_database_bytes: usize,
}

fn default_excluded_families() -> Vec<u8> {
    DEFAULT_EXCLUDED_FAMILIES.to_vec()
}

fn default_max_database_bytes() -> usize {
    MAX_DATABASE_BYTES
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            excluded_families: default_excluded_families(),
            max_database_bytes: MAX_DATABASE_BYTES,
        }
    }
}

impl CompactConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(s)?;
        config.add_excluded(&DEFAULT_EXCLUDED_FAMILIES);
        Ok(config)
    }

    fn add_excluded(&mut self, ids: &[u8]) {
        for id in ids {
            if !self.excluded_families.contains(id) {
                self.excluded_families.push(*id);
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s)
    }

    /// Config file if given, else defaults; `--exclude` ids are added on top.
    pub fn resolve(path: Option<&Path>, extra_excluded: &[u8]) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.add_excluded(extra_excluded);
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct CompactRun {
    pub database: PathBuf,
    pub template: PathBuf,
    pub out: PathBuf,
    pub debug_json: Option<PathBuf>,
    pub config: CompactConfig,
}

#[derive(Debug, Clone)]
pub struct DiffConfig {
    pub dump_a: PathBuf,
    pub dump_b: PathBuf,
    pub out: Option<PathBuf>,
}
