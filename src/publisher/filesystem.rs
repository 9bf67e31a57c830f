//! Publisher for targets that are directly reachable by clients.
//!
//! All byte-level work is delegated to the target storage; this type only
//! decides where a file goes and which URL it is served under.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{File, Identifier, PublishOutcome, PublisherOptions};
use crate::publisher::{Publisher, PublisherCore};
use crate::storage::{self, Storage};
use crate::utils;

/// Publishes into a web-accessible storage such as a document root or a bucket.
pub struct FilesystemPublisher {
    core: PublisherCore,
}

impl FilesystemPublisher {
    pub async fn new(target: Arc<dyn Storage>, options: &PublisherOptions) -> Result<Self> {
        Ok(Self {
            core: PublisherCore::new(target, options).await?,
        })
    }

    pub fn core(&self) -> &PublisherCore {
        &self.core
    }

    /// URL prefix: the configured base URI wins over the target's.
    pub fn base_uri(&self) -> &str {
        self.core
            .configured_base_uri()
            .unwrap_or_else(|| self.core.target_base_uri())
    }

    pub fn public_url(&self, destination: &Identifier) -> String {
        utils::join_uri(self.base_uri(), destination.as_str())
    }
}

#[async_trait]
impl Publisher for FilesystemPublisher {
    fn output_folder(&self, source: &Arc<dyn Storage>) -> Option<Identifier> {
        if storage::same_storage(self.core.target(), source) {
            self.core.base_dir().cloned()
        } else {
            None
        }
    }

    async fn publish_file_outcome(&self, file: &File) -> Result<PublishOutcome> {
        let destination = self.core.destination_path(file);
        let status = self.core.copy_if_absent(file, &destination).await?;
        Ok(PublishOutcome {
            url: self.public_url(&destination),
            destination,
            status,
        })
    }
}
