//! Storage abstractions for publishing.
//!
//! A storage is anything that can answer existence checks, create folders,
//! accept copied files and hand out a public base URI. Publishers treat both
//! the source of a file and the publishing target through this one trait.
//!
//! ## Backends
//!
//! ```text
//! LocalStorage   # directory on disk, atomic writes
//! MemoryStorage  # in-process map, for embedding and tests
//! S3Storage      # bucket + key prefix (feature "s3")
//! ```

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{File, Folder, Identifier};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Trait for storage backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short label used in log output.
    fn name(&self) -> &str;

    /// Public URL prefix under which this storage's files are reachable.
    fn base_uri(&self) -> String;

    /// Where the bytes physically live, if two handles can share it.
    fn location(&self) -> Option<String> {
        None
    }

    /// Whether a file exists at `identifier`.
    async fn has_file(&self, identifier: &Identifier) -> Result<bool>;

    /// Whether a folder exists at `identifier`.
    async fn has_folder(&self, identifier: &Identifier) -> Result<bool>;

    /// Create folder `name` below `parent`, including missing intermediates.
    ///
    /// Creating a folder that already exists is not an error.
    async fn create_folder(&self, name: &str, parent: &Folder) -> Result<Identifier>;

    /// Copy `file` (from whatever storage owns it) to `destination`.
    async fn copy_file(&self, file: &File, destination: &Identifier) -> Result<()>;

    /// Read the bytes of a file stored here.
    async fn read_file(&self, identifier: &Identifier) -> Result<Vec<u8>>;

    /// Direct child files of a folder, sorted by name.
    async fn list_files(&self, folder: &Identifier) -> Result<Vec<Identifier>>;

    /// Direct child folders of a folder, sorted by name.
    async fn list_folders(&self, folder: &Identifier) -> Result<Vec<Identifier>>;
}

/// Whether two handles read and write the same underlying storage.
pub fn same_storage(a: &Arc<dyn Storage>, b: &Arc<dyn Storage>) -> bool {
    if std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)) {
        return true;
    }
    matches!((a.location(), b.location()), (Some(x), Some(y)) if x == y)
}
