//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Publishing behavior
    #[serde(default)]
    pub publisher: PublisherOptions,

    /// Storage files are read from
    #[serde(default = "defaults::source")]
    pub source: StorageConfig,

    /// Storage files are published into
    #[serde(default = "defaults::target")]
    pub target: StorageConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.publisher.validate()?;
        self.source.validate("source")?;
        self.target.validate("target")?;
        if !defaults::LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(AppError::validation(format!(
                "logging.level '{}' is not one of {:?}",
                self.logging.level,
                defaults::LOG_LEVELS
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            publisher: PublisherOptions::default(),
            source: defaults::source(),
            target: defaults::target(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Options recognized by publishers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherOptions {
    /// Public URL prefix overriding the target's own base URI
    #[serde(default, alias = "baseUri")]
    pub base_uri: Option<String>,

    /// Subdirectory of the target that published copies are placed under
    #[serde(default, alias = "baseDir")]
    pub base_dir: Option<String>,
}

impl PublisherOptions {
    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(base_dir) = &self.base_dir {
            utils::normalize_base_dir(base_dir)?;
        }
        if let Some(base_uri) = &self.base_uri {
            utils::validate_base_uri(base_uri)?;
        }
        Ok(())
    }
}

/// Where a storage lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Directory on the local filesystem
    Local {
        root: PathBuf,
        #[serde(default = "defaults::base_uri")]
        base_uri: String,
    },
    /// In-process storage, starts empty
    Memory {
        #[serde(default = "defaults::base_uri")]
        base_uri: String,
    },
    /// S3 bucket (requires the `s3` feature)
    S3 {
        bucket: String,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        base_uri: Option<String>,
    },
}

impl StorageConfig {
    fn validate(&self, section: &str) -> Result<()> {
        match self {
            StorageConfig::Local { root, base_uri } => {
                if root.as_os_str().is_empty() {
                    return Err(AppError::validation(format!("{section}.root is empty")));
                }
                utils::validate_base_uri(base_uri)
            }
            StorageConfig::Memory { base_uri } => utils::validate_base_uri(base_uri),
            StorageConfig::S3 {
                bucket, base_uri, ..
            } => {
                if bucket.trim().is_empty() {
                    return Err(AppError::validation(format!("{section}.bucket is empty")));
                }
                match base_uri {
                    Some(uri) => utils::validate_base_uri(uri),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use super::StorageConfig;

    pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

    pub fn base_uri() -> String {
        "/".into()
    }

    pub fn source() -> StorageConfig {
        StorageConfig::Local {
            root: "storage/source".into(),
            base_uri: base_uri(),
        }
    }

    pub fn target() -> StorageConfig {
        StorageConfig::Local {
            root: "storage/public".into(),
            base_uri: "/public/".into(),
        }
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
