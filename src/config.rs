//! Engine configuration
//!
//! Read from `--config <file>`, else `<dataset root>/.dflow.toml`, else the
//! defaults below. `DFLOW_GIT` and `DFLOW_TIMEOUT_SECS` override the file.

use crate::error::{DataflowError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".dflow.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default)]
    pub datalad_save: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout_secs: default_timeout_secs(),
            datalad_save: false,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_ignored_names")]
    pub ignored_names: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignored_names: default_ignored_names(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_true")]
    pub annotate_commits: bool,
    #[serde(default = "default_max_log_scan")]
    pub max_log_scan: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            annotate_commits: true,
            max_log_scan: default_max_log_scan(),
        }
    }
}

/// Directory naming convention used to infer `produces` edges.
///
/// An empty `scripts` or `outputs` list switches inference off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
    #[serde(default = "default_outputs")]
    pub outputs: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            scripts: default_scripts(),
            outputs: default_outputs(),
        }
    }
}

impl InferenceConfig {
    pub fn disabled() -> Self {
        Self {
            scripts: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.scripts.is_empty() && !self.outputs.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreConfig {
    #[serde(default = "default_message_prefix")]
    pub message_prefix: String,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            message_prefix: default_message_prefix(),
        }
    }
}

fn default_program() -> String {
    "git".to_string()
}
fn default_timeout_secs() -> f64 {
    300.0
}
fn default_ignored_names() -> Vec<String> {
    vec![".DS_Store".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_max_log_scan() -> usize {
    1000
}
fn default_scripts() -> Vec<String> {
    vec!["code".to_string(), "scripts".to_string()]
}
fn default_outputs() -> Vec<String> {
    vec!["outputs".to_string(), "results".to_string()]
}
fn default_message_prefix() -> String {
    "Restore".to_string()
}

impl Config {
    /// Loads the configuration for a dataset.
    ///
    /// An explicit file must exist; the per-dataset file is optional.
    pub fn load(dataset_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidate = dataset_root.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_file(&candidate)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate(explicit.unwrap_or(&dataset_root.join(CONFIG_FILE_NAME)))?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DataflowError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content, path)
    }

    pub fn from_toml(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| DataflowError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(program) = lookup("DFLOW_GIT")
            && !program.trim().is_empty()
        {
            self.backend.program = program;
        }

        if let Some(secs) = lookup("DFLOW_TIMEOUT_SECS") {
            self.backend.timeout_secs =
                secs.trim().parse::<f64>().map_err(|e| DataflowError::Config {
                    path: PathBuf::from("DFLOW_TIMEOUT_SECS"),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        if !self.backend.timeout_secs.is_finite() || self.backend.timeout_secs <= 0.0 {
            return Err(DataflowError::Config {
                path: origin.to_path_buf(),
                reason: format!(
                    "backend.timeout_secs must be positive, got {}",
                    self.backend.timeout_secs
                ),
            });
        }

        if self.backend.program.trim().is_empty() {
            return Err(DataflowError::Config {
                path: origin.to_path_buf(),
                reason: "backend.program must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
