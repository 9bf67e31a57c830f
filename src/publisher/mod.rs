//! Publishing of files and folders into a target storage.
//!
//! - `PublisherCore`: shared construction, destination paths and
//!   copy-if-absent
//! - `FilesystemPublisher`: concrete publisher handing out URLs below the
//!   target's (or the configured) base URI
//! - `Publisher::publish_folder`: depth-first traversal on top of
//!   `publish_file`

mod base;
mod filesystem;
mod locks;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{File, Folder, Identifier, PublishOutcome, PublishReport};
use crate::storage::Storage;

pub use base::PublisherCore;
pub use filesystem::FilesystemPublisher;
pub use locks::DestinationLocks;

/// What a folder traversal does when one file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Record the failure in the report and keep going.
    Continue,
}

/// Trait for publishers.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one file, reporting whether a copy happened.
    async fn publish_file_outcome(&self, file: &File) -> Result<PublishOutcome>;

    /// Folder of `source` that holds this publisher's own output, if any.
    ///
    /// Folder traversals never descend into it.
    fn output_folder(&self, _source: &Arc<dyn Storage>) -> Option<Identifier> {
        None
    }

    /// Publish one file and return its public URL.
    ///
    /// Publishing a file the target already has performs no copy and
    /// returns the same URL.
    async fn publish_file(&self, file: &File) -> Result<String> {
        Ok(self.publish_file_outcome(file).await?.url)
    }

    /// Publish every file below `folder`, aborting on the first failure.
    async fn publish_folder(&self, folder: &Folder) -> Result<PublishReport> {
        self.publish_folder_with(folder, FailurePolicy::Abort).await
    }

    /// Publish every file below `folder`, depth-first.
    ///
    /// Files of a folder come before its subfolders; siblings keep the
    /// storage's listing order. The whole tree is listed before the first
    /// copy, so files written during the traversal are never picked up.
    async fn publish_folder_with(
        &self,
        folder: &Folder,
        policy: FailurePolicy,
    ) -> Result<PublishReport> {
        let mut report = PublishReport::new(folder.identifier().clone());
        let output = self.output_folder(folder.storage());
        let mut files = Vec::new();
        let mut pending = vec![folder.clone()];

        while let Some(current) = pending.pop() {
            log::debug!("Listing folder {}", current.identifier());

            match current.files().await {
                Ok(listed) => files.extend(listed),
                Err(e) => {
                    handle_failure(&mut report, policy, current.identifier(), e)?;
                    continue;
                }
            }

            match current.subfolders().await {
                Ok(subfolders) => {
                    // Reversed so the first listed subfolder is popped next.
                    pending.extend(
                        subfolders
                            .into_iter()
                            .rev()
                            .filter(|sub| Some(sub.identifier()) != output.as_ref()),
                    );
                }
                Err(e) => handle_failure(&mut report, policy, current.identifier(), e)?,
            }
        }

        for file in files {
            match self.publish_file_outcome(&file).await {
                Ok(outcome) => report.record(file.identifier().clone(), outcome),
                Err(e) => handle_failure(&mut report, policy, file.identifier(), e)?,
            }
        }

        let report = report.finish();
        log::info!(
            "Published folder {}: {} copied, {} already present, {} failed",
            report.root,
            report.published,
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }
}

/// Either propagate `error` or record it, depending on the policy.
fn handle_failure(
    report: &mut PublishReport,
    policy: FailurePolicy,
    identifier: &Identifier,
    error: crate::error::AppError,
) -> Result<()> {
    match policy {
        FailurePolicy::Abort => Err(error),
        FailurePolicy::Continue => {
            log::warn!("Failed to publish {}: {}", identifier, error);
            report.record_failure(identifier.clone(), error.to_string());
            Ok(())
        }
    }
}
