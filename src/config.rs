//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `config.toml` in the platform config dir)
//! 3. `ENDOLOG_*` environment variables (`__` separates nested keys, e.g.
//!    `ENDOLOG_DEVICE__BAUD_RATE=115200`)
//! 4. CLI flags, merged with [`Config::merge_cli`]
//!
//! ```toml
//! output_folder = "Endo_Data"
//! stop_grace_ms = 1000
//!
//! [naming]
//! experiment_type = "CR"
//!
//! [device]
//! baud_rate = 9600
//! read_timeout_ms = 1000
//! settle_delay_ms = 2000
//! keywords = ["ARDUINO", "CH340", "USB SERIAL", "FTDI"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::device::{LinkSettings, DEFAULT_KEYWORDS};
use crate::naming::{NamingFields, DEFAULT_OUTPUT_FOLDER};
use crate::recorder::RecorderSettings;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "ENDOLOG_";

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be parsed or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("invalid configuration value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// Platform directories could not be determined.
    #[error("failed to determine platform directories")]
    NoProjectDirs,

    #[error("failed to write configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serial link and session timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub baud_rate: u32,
    /// Per-read timeout; bounds stop latency.
    pub read_timeout_ms: u64,
    /// Pause after opening the port.
    pub settle_delay_ms: u64,
    /// Port description keywords for auto-detection.
    pub keywords: Vec<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Credential file; the platform data dir is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_file: Option<PathBuf>,
    /// Initial output folder.
    pub output_folder: PathBuf,
    /// Wait after a stop before signing out or exiting.
    pub stop_grace_ms: u64,
    /// Initial naming field values.
    pub naming: NamingFields,
    pub device: DeviceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users_file: None,
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            stop_grace_ms: 1000,
            naming: NamingFields::default(),
            device: DeviceConfig::default(),
        }
    }
}

impl Config {
    /// Load from `explicit` or the default config path, plus environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a layer is malformed or a value is out of
    /// range.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_config_path().ok(),
        };
        match path {
            Some(path) => Self::load_from_path(&path),
            None => Self::from_figment(Self::base_figment().merge(Self::env_provider())),
        }
    }

    /// Load from a specific TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
        } else {
            log::debug!("No configuration file at {}, using defaults", path.display());
        }
        let figment = Self::base_figment()
            .merge(Toml::file(path))
            .merge(Self::env_provider());
        Self::from_figment(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the session misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                key: "device.baud_rate",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.device.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "device.read_timeout_ms",
                reason: "must be greater than zero so stop requests are observed".to_string(),
            });
        }
        Ok(())
    }

    /// Apply global CLI flags.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(users_file) = &cli.users_file {
            self.users_file = Some(users_file.clone());
        }
    }

    /// Save as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Credential file path, falling back to the platform data dir.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no home directory is known.
    pub fn users_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.users_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("users.json")),
        }
    }

    /// Log file used while the TUI owns the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no home directory is known.
    pub fn log_file_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.data_dir().join("endolog.log"))
    }

    /// Platform-specific default `config.toml` path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no home directory is known.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    #[must_use]
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            link: LinkSettings {
                baud_rate: self.device.baud_rate,
                read_timeout: Duration::from_millis(self.device.read_timeout_ms),
            },
            settle_delay: Duration::from_millis(self.device.settle_delay_ms),
        }
    }

    #[must_use]
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "endolog", "endolog").ok_or(ConfigError::NoProjectDirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output_folder, PathBuf::from("Endo_Data"));
        assert_eq!(config.device.baud_rate, 9600);
        assert_eq!(config.device.keywords.len(), 4);
        assert_eq!(config.stop_grace(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recorder_settings_from_config() {
        let mut config = Config::default();
        config.device.read_timeout_ms = 250;
        config.device.settle_delay_ms = 0;
        let settings = config.recorder_settings();
        assert_eq!(settings.link.read_timeout, Duration::from_millis(250));
        assert!(settings.settle_delay.is_zero());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.device.read_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "device.read_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_save_writes_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let mut config = Config::default();
        config.device.baud_rate = 115_200;
        config.save(&path).unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("baud_rate = 115200"));
        assert!(!saved.contains("users_file"));
    }

    #[test]
    fn test_users_path_override() {
        let config = Config {
            users_file: Some(PathBuf::from("/srv/users.json")),
            ..Config::default()
        };
        assert_eq!(config.users_path().unwrap(), PathBuf::from("/srv/users.json"));
    }
}
