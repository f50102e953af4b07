//! Engine configuration: scanner chunking, injection timeouts, logging

mod defaults;
mod loader;

pub use loader::{Config, ConfigError, ConfigLoader, InjectionConfig, LoggingConfig, ScannerConfig};

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
