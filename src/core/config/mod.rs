use crate::core::error::CoreError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE: &str = "morpho.toml";

/// Main Morpho configuration loaded from morpho.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MorphoConfig {
    /// Storage root configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Engine selection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Execution limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Storage root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Read-mostly root scanned first; shipped transformations live here
    #[serde(default = "default_builtin_root")]
    pub builtin_root: PathBuf,

    /// Read-write root where added transformations are materialized
    #[serde(default = "default_user_root")]
    pub user_root: PathBuf,

    /// Parent directory for scratch files; system temp when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_root: Option<PathBuf>,
}

/// Engine selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Registered engine name to execute transformations with
    #[serde(default = "default_engine_name")]
    pub name: String,
}

/// Execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Wall-clock budget for a single transformation run (seconds)
    #[serde(default = "default_run_timeout")]
    pub run_timeout_seconds: u64,

    /// Wall-clock budget shared by every step of a chain (seconds)
    #[serde(default = "default_chain_timeout")]
    pub chain_timeout_seconds: u64,
}

fn default_builtin_root() -> PathBuf {
    PathBuf::from("transformations")
}

fn default_user_root() -> PathBuf {
    PathBuf::from("user-transformations")
}

fn default_engine_name() -> String {
    "rulemap".to_string()
}

fn default_run_timeout() -> u64 {
    60
}

fn default_chain_timeout() -> u64 {
    300
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            builtin_root: default_builtin_root(),
            user_root: default_user_root(),
            scratch_root: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: default_engine_name(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            run_timeout_seconds: default_run_timeout(),
            chain_timeout_seconds: default_chain_timeout(),
        }
    }
}

impl MorphoConfig {
    /// Load configuration with deterministic precedence: an explicit path must
    /// exist; otherwise `morpho.toml` in the working directory is used when
    /// present; otherwise built-in defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CoreError::validation(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    return Ok(MorphoConfig::default());
                }
                default
            }
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::io(format!("reading config {}", path.display()), e))?;
        toml::from_str(&raw)
            .map_err(|e| CoreError::validation(format!("parsing {}: {e}", path.display())))
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.run_timeout_seconds)
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.chain_timeout_seconds)
    }
}
