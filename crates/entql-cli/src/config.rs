//! Configuration for the entql command line
//!
//! Loads configuration from:
//! 1. config.yaml - translator limits, logging and the metadata catalog path
//! 2. .env file - local overrides
//!
//! Environment variables always override config.yaml values.

use entql_ir::metadata::{EntityMetadata, StaticMetadataProvider};
use entql_ir::translate::TranslateOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnvVar { name: String, value: String },

    #[error("No metadata catalog configured (set metadata.path or ENTQL_METADATA_PATH)")]
    MissingCatalog,
}

/// Translator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Deepest nesting of filter groups and join chains
    pub max_nesting_depth: usize,

    /// LIKE wildcard character
    pub wildcard: char,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        let options = TranslateOptions::default();
        Self {
            max_nesting_depth: options.max_nesting_depth,
            wildcard: options.wildcard,
        }
    }
}

impl TranslatorConfig {
    pub fn options(&self) -> TranslateOptions {
        TranslateOptions {
            max_nesting_depth: self.max_nesting_depth,
            wildcard: self.wildcard,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Metadata catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// YAML file listing entity metadata
    pub path: Option<String>,
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translator: TranslatorConfig,
    pub logging: LoggingConfig,
    pub metadata: MetadataConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(depth) = lookup("ENTQL_MAX_NESTING_DEPTH") {
            self.translator.max_nesting_depth =
                depth.parse().map_err(|_| ConfigError::InvalidEnvVar {
                    name: "ENTQL_MAX_NESTING_DEPTH".to_string(),
                    value: depth.clone(),
                })?;
        }
        if let Some(wildcard) = lookup("ENTQL_WILDCARD") {
            let mut chars = wildcard.chars();
            self.translator.wildcard = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(ConfigError::InvalidEnvVar {
                        name: "ENTQL_WILDCARD".to_string(),
                        value: wildcard,
                    })
                }
            };
        }
        if let Some(path) = lookup("ENTQL_METADATA_PATH") {
            self.metadata.path = Some(path);
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(output) = lookup("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = dir;
        }
        Ok(())
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }

    /// Load the configured metadata catalog
    pub fn load_catalog(&self) -> Result<StaticMetadataProvider, ConfigError> {
        let path = self.metadata.path.as_ref().ok_or(ConfigError::MissingCatalog)?;
        load_catalog(path)
    }
}

/// Read a YAML list of entity metadata into an in-memory catalog
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<StaticMetadataProvider, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let entities: Vec<EntityMetadata> = serde_yaml::from_str(&contents)?;
    Ok(StaticMetadataProvider::from_entities(entities))
}
