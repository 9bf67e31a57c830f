// src/config.rs

//! Configuration loading utilities.
//!
//! This module turns configuration files into ready-to-use storages and
//! publishers.

use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, StorageConfig};
use crate::publisher::FilesystemPublisher;
use crate::storage::{LocalStorage, MemoryStorage, Storage};

/// Load and validate configuration from a TOML file.
///
/// A missing file falls back to defaults; a file that exists but does not
/// parse or validate is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)?
    } else {
        log::warn!("No config at {}, using defaults.", path.display());
        Config::default()
    };

    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid config {}: {e}", path.display())))?;
    Ok(config)
}

/// Build a storage backend from its configuration.
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match config {
        StorageConfig::Local { root, base_uri } => {
            Ok(Arc::new(LocalStorage::new(root.clone(), base_uri.clone())))
        }
        StorageConfig::Memory { base_uri } => Ok(Arc::new(MemoryStorage::new(base_uri.clone()))),
        #[cfg(feature = "s3")]
        StorageConfig::S3 {
            bucket,
            prefix,
            base_uri,
        } => {
            let storage =
                crate::storage::S3Storage::from_env(bucket, prefix, base_uri.clone()).await?;
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { bucket, .. } => Err(AppError::config(format!(
            "storage bucket '{bucket}' needs the 's3' feature"
        ))),
    }
}

/// Build the configured target and a publisher on top of it.
pub async fn build_publisher(config: &Config) -> Result<FilesystemPublisher> {
    let target = build_storage(&config.target).await?;
    FilesystemPublisher::new(target, &config.publisher).await
}
