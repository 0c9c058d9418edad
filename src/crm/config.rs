use crate::error::{CrmError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "crm.json";
const DEFAULT_DATA_FILE: &str = "customers.txt";
const DEFAULT_NOTIFIER_NAME: &str = "System";

/// Configuration for crm, stored in crm.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrmConfig {
    /// Path of the data file. Relative paths resolve against the working directory.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Label shown in console notifications: `[NOTIFICATION - <name>]`
    #[serde(default = "default_notifier_name")]
    pub notifier_name: String,

    /// Write to a temp file and rename instead of overwriting in place.
    #[serde(default = "default_atomic_save")]
    pub atomic_save: bool,
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_notifier_name() -> String {
    DEFAULT_NOTIFIER_NAME.to_string()
}

fn default_atomic_save() -> bool {
    true
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            notifier_name: default_notifier_name(),
            atomic_save: default_atomic_save(),
        }
    }
}

impl CrmConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(CrmError::Io)?;
        let config: CrmConfig = serde_json::from_str(&content).map_err(CrmError::Config)?;
        log::debug!("event=config_load path={}", config_path.display());
        Ok(config)
    }

    /// Looks in `cwd` first, then in the user config directory.
    pub fn discover<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let cwd = cwd.as_ref();
        if cwd.join(CONFIG_FILENAME).exists() {
            return Self::load(cwd);
        }
        match user_config_dir() {
            Some(dir) => Self::load(dir),
            None => Ok(Self::default()),
        }
    }
}

fn user_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "crm", "crm").map(|dirs| dirs.config_dir().to_path_buf())
}
