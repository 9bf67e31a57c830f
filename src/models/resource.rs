// src/models/resource.rs

//! File and folder handles.
//!
//! Handles are cheap to clone: they carry an identifier plus a shared
//! reference to the storage that owns the bytes. Folder contents are never
//! cached here and are listed through the storage on demand.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::models::Identifier;
use crate::storage::Storage;

/// A file inside a storage backend.
#[derive(Clone)]
pub struct File {
    identifier: Identifier,
    storage: Arc<dyn Storage>,
}

impl File {
    pub fn new(identifier: Identifier, storage: Arc<dyn Storage>) -> Self {
        Self {
            identifier,
            storage,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The storage this file lives in.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Read the file contents from its own storage.
    pub async fn contents(&self) -> Result<Vec<u8>> {
        self.storage.read_file(&self.identifier).await
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("identifier", &self.identifier)
            .field("storage", &self.storage.name())
            .finish()
    }
}

/// A folder inside a storage backend.
#[derive(Clone)]
pub struct Folder {
    identifier: Identifier,
    storage: Arc<dyn Storage>,
}

impl Folder {
    pub fn new(identifier: Identifier, storage: Arc<dyn Storage>) -> Self {
        Self {
            identifier,
            storage,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Direct child files, in storage listing order.
    pub async fn files(&self) -> Result<Vec<File>> {
        let ids = self.storage.list_files(&self.identifier).await?;
        Ok(ids
            .into_iter()
            .map(|id| File::new(id, Arc::clone(&self.storage)))
            .collect())
    }

    /// Direct child folders, in storage listing order.
    pub async fn subfolders(&self) -> Result<Vec<Folder>> {
        let ids = self.storage.list_folders(&self.identifier).await?;
        Ok(ids
            .into_iter()
            .map(|id| Folder::new(id, Arc::clone(&self.storage)))
            .collect())
    }
}

impl fmt::Debug for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder")
            .field("identifier", &self.identifier)
            .field("storage", &self.storage.name())
            .finish()
    }
}

/// Root-level folder of a storage.
pub fn root_level_folder(storage: &Arc<dyn Storage>) -> Folder {
    Folder::new(Identifier::root(), Arc::clone(storage))
}
