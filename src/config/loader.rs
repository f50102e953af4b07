//! Configuration loading from TOML with validated defaults

use super::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub injection: InjectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: ScannerConfig::default(),
            injection: InjectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Scanner tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Bytes read from the target per chunk during a first scan
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            chunk_size: defaults::chunk_size(),
        }
    }
}

/// Injection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Upper bound on a remote loader thread's runtime
    #[serde(default = "defaults::wait_timeout_ms")]
    pub wait_timeout_ms: u64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        InjectionConfig {
            wait_timeout_ms: defaults::wait_timeout_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: defaults::log_level(),
        }
    }
}

impl Config {
    /// Rejects configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.chunk_size == 0 {
            return Err(ConfigError::Invalid("scanner.chunk_size must be > 0".into()));
        }
        if self.injection.wait_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "injection.wait_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads and validates the file
    pub fn load(&self) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file, falling back to defaults when it does not exist.
    /// A present-but-broken file is still an error.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            self.load()
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.chunk_size, 65536);
        assert_eq!(config.injection.wait_timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("[scanner]\nchunk_size = 4096\n").unwrap();
        assert_eq!(config.scanner.chunk_size, 4096);
        assert_eq!(config.injection.wait_timeout_ms, 5000);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config: Config = toml::from_str("[scanner]\nchunk_size = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config: Config = toml::from_str("[injection]\nwait_timeout_ms = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loader = ConfigLoader::new("definitely/not/here.toml");
        let config = loader.load_or_default().unwrap();
        assert_eq!(config.scanner.chunk_size, 65536);
    }

    #[test]
    fn broken_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        let loader = ConfigLoader::new(file.path());
        assert!(loader.load_or_default().is_err());
    }

    #[test]
    fn full_file_round_trips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scanner]\nchunk_size = 8192\n\n[injection]\nwait_timeout_ms = 1000\n\n[logging]\nlevel = \"debug\"\n"
        )
        .unwrap();
        let config = ConfigLoader::new(file.path()).load().unwrap();
        assert_eq!(config.scanner.chunk_size, 8192);
        assert_eq!(config.injection.wait_timeout_ms, 1000);
        assert_eq!(config.logging.level, "debug");
    }
}
