use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::EvalError;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harness: HarnessConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub evaluation: EvalConfig,
}

/// Harness-wide settings
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Input files for the eval CLI
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Training interactions, one `user<TAB>item[...]` per line.
    pub train_path: PathBuf,
    /// Held-out test instances, same format as the training file.
    /// For online evaluation the lines must already be in time order.
    pub test_path: PathBuf,
    /// Negative candidates per user, `(user,item)<TAB>neg1<TAB>neg2...`.
    pub negatives_path: PathBuf,
}

/// Evaluation settings consumed by [`crate::eval::Evaluator`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Rank cutoff.
    pub top_k: usize,
    /// Offline worker count.
    pub thread_num: usize,
    /// Reserved: exclude training items from the ranked list. Currently has no effect.
    pub ignore_train: bool,
    /// Online progress cadence in instances (0 disables running lines).
    pub interval: usize,
    /// `Recommender::apply` calls per online observation.
    pub max_iter_online: usize,
    /// Highest training-history bucket in the online breakdown.
    pub breakdown_intervals: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            top_k: 100,
            thread_num: 1,
            ignore_train: false,
            interval: 100,
            max_iter_online: 1,
            breakdown_intervals: 10,
        }
    }
}

impl EvalConfig {
    /// Validate numeric ranges
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.top_k == 0 {
            return Err(EvalError::Config(
                "evaluation.top_k must be greater than 0".to_string(),
            ));
        }
        if self.thread_num == 0 {
            return Err(EvalError::Config(
                "evaluation.thread_num must be greater than 0".to_string(),
            ));
        }
        if self.max_iter_online == 0 {
            return Err(EvalError::Config(
                "evaluation.max_iter_online must be greater than 0".to_string(),
            ));
        }
        if self.breakdown_intervals == 0 {
            return Err(EvalError::Config(
                "evaluation.breakdown_intervals must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in TOPKEVAL_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("TOPKEVAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, path) in [
            ("data.train_path", &self.data.train_path),
            ("data.test_path", &self.data.test_path),
            ("data.negatives_path", &self.data.negatives_path),
        ] {
            if !path.is_file() {
                anyhow::bail!("{} does not point to a file: {}", key, path.display());
            }
        }

        self.evaluation.validate()?;

        Ok(())
    }
}
