// src/models/report.rs

//! Summary of a folder publishing run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Identifier;

/// What happened to a single file during publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// The file was copied into the target.
    Copied,
    /// The target already had the file; nothing was copied.
    Skipped,
}

/// Outcome of publishing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub url: String,
    pub destination: Identifier,
    pub status: PublishStatus,
}

/// A file that could not be published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishFailure {
    pub identifier: Identifier,
    pub message: String,
}

/// One published (or already present) file and its public URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedEntry {
    pub identifier: Identifier,
    pub url: String,
    pub status: PublishStatus,
}

/// Metadata about a folder publishing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    /// Folder the run started from
    pub root: Identifier,
    /// Number of files copied into the target
    pub published: usize,
    /// Number of files the target already had
    pub skipped: usize,
    /// Every file that ended up reachable, in traversal order
    pub entries: Vec<PublishedEntry>,
    /// Files that failed (only populated when continuing on error)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PublishFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PublishReport {
    pub fn new(root: Identifier) -> Self {
        let now = Utc::now();
        Self {
            root,
            published: 0,
            skipped: 0,
            entries: Vec::new(),
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Record a successful file outcome.
    pub fn record(&mut self, identifier: Identifier, outcome: PublishOutcome) {
        match outcome.status {
            PublishStatus::Copied => self.published += 1,
            PublishStatus::Skipped => self.skipped += 1,
        }
        self.entries.push(PublishedEntry {
            identifier,
            url: outcome.url,
            status: outcome.status,
        });
    }

    pub fn record_failure(&mut self, identifier: Identifier, message: impl Into<String>) {
        self.failures.push(PublishFailure {
            identifier,
            message: message.into(),
        });
    }

    /// Total number of files the traversal attempted.
    pub fn total(&self) -> usize {
        self.entries.len() + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}
