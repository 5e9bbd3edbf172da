//! Optional TOML configuration for `cram`.
//!
//! ```toml
//! log_path = "cram.log"
//!
//! [limits]
//! max_groups = 64
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::model::Limits;

pub const DEFAULT_LOG_PATH: &str = "cram.log";

/// Missing fields default to the built-in values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CramConfig {
    /// Append session events to `log_path`.
    pub log_enabled: bool,

    pub log_path: PathBuf,

    pub limits: Limits,
}

impl Default for CramConfig {
    fn default() -> Self {
        Self {
            log_enabled: true,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            limits: Limits::default(),
        }
    }
}

impl CramConfig {
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        let positive = [
            ("max_file_bytes", limits.max_file_bytes),
            ("max_line_len", limits.max_line_len),
            ("max_groups", limits.max_groups),
            ("max_items", limits.max_items),
            ("max_wait_loops", limits.max_wait_loops),
            ("max_prompts", limits.max_prompts),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(anyhow!("limits.{name} must be > 0"));
            }
        }
        if limits.max_file_bytes > u32::MAX as usize {
            return Err(anyhow!("limits.max_file_bytes must be <= {}", u32::MAX));
        }
        if limits.max_line_len > limits.max_file_bytes {
            return Err(anyhow!("limits.max_line_len must be <= limits.max_file_bytes"));
        }
        if self.log_enabled && self.log_path.as_os_str().is_empty() {
            return Err(anyhow!("log_path must be non-empty when log_enabled"));
        }
        Ok(())
    }
}

/// Load and validate config from a TOML file.
pub fn load_config(path: &Path) -> Result<CramConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CramConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
