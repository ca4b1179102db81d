//! Configuration for Tern

mod ingest;
mod logging;
mod store;

pub use ingest::IngestConfig;
pub use logging::{LogLevel, LoggingConfig};
pub use store::StoreConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration, constructed once at process start and passed by
/// reference into the scanner, processor and store adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store connection configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// After deserializing, this applies the `MONGO_*` environment
    /// overrides and validates all fields so callers don't need to
    /// remember either step.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.store.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.ingest.chunk_size == 0 {
            errors.push("chunk_size must be positive".to_string());
        }
        if self.store.host.is_empty() {
            errors.push("store host must not be empty".to_string());
        }
        if self.store.database.is_empty() {
            errors.push("store database must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
