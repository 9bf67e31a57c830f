//! State and behavior shared by all publishers.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{File, Identifier, PublishStatus, PublisherOptions, root_level_folder};
use crate::publisher::DestinationLocks;
use crate::storage::Storage;
use crate::utils;

/// Target, options and the copy-if-absent step every publisher builds on.
pub struct PublisherCore {
    target: Arc<dyn Storage>,
    base_dir: Option<Identifier>,
    base_uri: Option<String>,
    target_base_uri: String,
    locks: DestinationLocks,
}

impl PublisherCore {
    /// Validate `options` against `target`.
    ///
    /// Creates the base directory in the target when it is configured and
    /// missing. No other I/O happens here.
    pub async fn new(target: Arc<dyn Storage>, options: &PublisherOptions) -> Result<Self> {
        let base_dir = match &options.base_dir {
            Some(raw) => utils::normalize_base_dir(raw)?,
            None => None,
        };
        if let Some(base_uri) = &options.base_uri {
            utils::validate_base_uri(base_uri)?;
        }

        if let Some(dir) = &base_dir {
            if !target.has_folder(dir).await? {
                let root = root_level_folder(&target);
                target.create_folder(dir.as_str(), &root).await?;
                log::info!("Created base directory {} in {} target", dir, target.name());
            }
        }

        let target_base_uri = target.base_uri();

        Ok(Self {
            target,
            base_dir,
            base_uri: options.base_uri.clone(),
            target_base_uri,
            locks: DestinationLocks::new(),
        })
    }

    pub fn target(&self) -> &Arc<dyn Storage> {
        &self.target
    }

    /// Normalized base directory, if any.
    pub fn base_dir(&self) -> Option<&Identifier> {
        self.base_dir.as_ref()
    }

    /// Base URI from the publisher options.
    pub fn configured_base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Base URI reported by the target at construction time.
    pub fn target_base_uri(&self) -> &str {
        &self.target_base_uri
    }

    /// Where `file` ends up inside the target.
    pub fn destination_path(&self, file: &File) -> Identifier {
        match &self.base_dir {
            Some(dir) => file.identifier().prefixed_with(dir),
            None => file.identifier().clone(),
        }
    }

    /// Copy `file` to `destination` unless the target already has it.
    pub async fn copy_if_absent(
        &self,
        file: &File,
        destination: &Identifier,
    ) -> Result<PublishStatus> {
        let _guard = self.locks.acquire(destination).await;

        if self.target.has_file(destination).await? {
            log::debug!("{} already published, skipping copy", destination);
            return Ok(PublishStatus::Skipped);
        }

        self.target.copy_file(file, destination).await?;
        log::info!("Published {} to {}", file.identifier(), destination);
        Ok(PublishStatus::Copied)
    }
}
