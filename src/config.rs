use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::remote::{DEFAULT_REMOTE_PROGRAM, DEFAULT_TIMEOUT};

const APP_DIR: &str = "modx-remote";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ssh client config consulted for alias detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_config: Option<String>,
    pub remote_program: String,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ssh_config: None,
            remote_program: DEFAULT_REMOTE_PROGRAM.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ssh_config_path(&self) -> Option<PathBuf> {
        self.ssh_config
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(APP_DIR);
        Self::with_dir(config_dir)
    }

    pub fn with_dir(config_dir: PathBuf) -> Result<Self> {
        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        let config_file = config_dir.join("config.toml");

        Ok(Self {
            config_dir,
            config_file,
        })
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        // If config file doesn't exist, create it with default values
        if !self.config_file.exists() {
            let default_config = AppConfig::default();
            self.save_config(&default_config)?;
        }

        let content =
            fs::read_to_string(&self.config_file).context("Failed to read config file")?;

        let mut config: AppConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        if config.remote_program.trim().is_empty() {
            config.remote_program = DEFAULT_REMOTE_PROGRAM.to_string();
        }
        if config.timeout_secs == 0 {
            config.timeout_secs = DEFAULT_TIMEOUT.as_secs();
        }

        Ok(config)
    }

    /// Like [`load_config`](Self::load_config), but a broken or unreadable
    /// file falls back to the defaults instead of failing the run.
    pub fn load_or_default(&self) -> AppConfig {
        self.load_config().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            eprintln!("Warning: using default config: {:#}", e);
            AppConfig::default()
        })
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_file, toml).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_file
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_config_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().join("modx-remote")).unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(manager.config_path().exists());
        assert_eq!(config.timeout(), Duration::from_secs(3600));
        assert_eq!(config.remote_program, "modx");
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), "ssh_config = \"/etc/ssh/custom\"\n").unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config.ssh_config_path(), Some(PathBuf::from("/etc/ssh/custom")));
        assert_eq!(config.remote_program, "modx");
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn zero_timeout_and_blank_program_are_reset() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf()).unwrap();
        fs::write(
            manager.config_path(),
            "remote_program = \"  \"\ntimeout_secs = 0\nssh_config = \"\"\n",
        )
        .unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config.remote_program, "modx");
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.ssh_config_path(), None);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), "timeout_secs = \"soon\"").unwrap();

        let err = manager.load_config().unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), "remote_program = [").unwrap();

        assert_eq!(manager.load_or_default(), AppConfig::default());
    }
}
