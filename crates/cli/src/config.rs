use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use topicsim_core::SimConfig;

use crate::cli::RunOverrides;

pub const DEFAULT_CONFIG: &str = "topicsim.toml";
pub const DEFAULT_DB: &str = "lda_simulation.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB),
        }
    }
}

/// Reads `path`, or `DEFAULT_CONFIG` when none was given. A missing default
/// file yields the built-in defaults; a missing explicit file is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    if !path.exists() {
        if explicit {
            return Err(anyhow!("config file {} not found", path.display()));
        }
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
}

impl AppConfig {
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("TOPICSIM_DB") {
            self.database.path = PathBuf::from(db);
        }
        if let Some(seed) = lookup("TOPICSIM_SEED") {
            let seed = seed
                .trim()
                .parse()
                .map_err(|_| anyhow!("TOPICSIM_SEED must be an unsigned integer, got {seed}"))?;
            self.simulation.generation_seed = Some(seed);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, db: Option<&Path>, overrides: &RunOverrides) {
        if let Some(db) = db {
            self.database.path = db.to_path_buf();
        }
        let sim = &mut self.simulation;
        if let Some(v) = overrides.topics {
            sim.topics = v;
        }
        if let Some(v) = overrides.vocab_size {
            sim.vocab_size = v;
        }
        if let Some(v) = overrides.docs {
            sim.docs = v;
        }
        if let Some(v) = overrides.alpha {
            sim.alpha = v;
        }
        if let Some(v) = overrides.doc_length {
            sim.doc_length = v;
        }
        if let Some(v) = overrides.high_share {
            sim.high_share = v;
        }
        if let Some(v) = overrides.seed {
            sim.generation_seed = Some(v);
        }
        if let Some(v) = overrides.iterations {
            sim.inference.iterations = v;
        }
        if let Some(v) = overrides.inference_seed {
            sim.inference.seed = v;
        }
    }
}
