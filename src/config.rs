use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DtmError, Result};

/// Default number of concurrently running vector processing units
pub const DEFAULT_POOL_SIZE: usize = 10;
/// Five minute samples over a 24 hour accounting period
pub const DEFAULT_SAMPLES_IN_ACCOUNTING_PERIOD: u32 = 288;

/// How two compensation vectors are compared before sending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SuppressionPolicy {
    /// Any difference requires an update
    #[default]
    Exact,
    /// Components within `threshold` of the last sent value count as equal
    Threshold { threshold: u64 },
}

/// Runtime parameters handed over by the surrounding process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pool_size: usize,
    pub samples_in_accounting_period: u32,
    pub suppression: SuppressionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            samples_in_accounting_period: DEFAULT_SAMPLES_IN_ACCOUNTING_PERIOD,
            suppression: SuppressionPolicy::default(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(|e| DtmError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .map_err(|e| DtmError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&data)
    }

    /// Standard location: `<config dir>/sbox/dtm.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sbox")
            .join("dtm.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(DtmError::Config("pool_size must be greater than 0".into()));
        }
        Ok(())
    }
}
