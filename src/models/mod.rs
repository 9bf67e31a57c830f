// src/models/mod.rs

//! Domain models for the publisher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod identifier;
mod report;
mod resource;

// Re-export all public types
pub use config::{Config, LoggingConfig, PublisherOptions, StorageConfig};
pub use identifier::Identifier;
pub use report::{PublishFailure, PublishOutcome, PublishReport, PublishStatus, PublishedEntry};
pub use resource::{File, Folder, root_level_folder};
