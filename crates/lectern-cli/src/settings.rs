//! Data directory and scheduling config resolution

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use lectern_core::{RawSchedulingConfig, SchedulingConfig};

/// Database file name inside the data directory
pub const DB_FILE: &str = "lectern.db";

/// Config file name looked up inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Resolved locations for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl Settings {
    /// `--data-dir` if given, otherwise the platform data directory
    pub fn resolve(data_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Self {
            data_dir,
            config_path,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    /// Effective config: the explicit file, else `config.json` in the data
    /// directory, else defaults. An explicit path that does not exist is an
    /// error.
    pub fn load_config(&self) -> anyhow::Result<SchedulingConfig> {
        let path = match &self.config_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let candidate = self.data_dir.join(CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading scheduling config");
                load_config_file(&path)
            }
            None => Ok(SchedulingConfig::default()),
        }
    }
}

/// Parse and validate a config file
pub fn load_config_file(path: &Path) -> anyhow::Result<SchedulingConfig> {
    let config = RawSchedulingConfig::from_path(path)?.validate()?;
    Ok(config)
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("org", "lectern", "lectern")
        .ok_or_else(|| anyhow::anyhow!("Could not determine project directories"))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}
