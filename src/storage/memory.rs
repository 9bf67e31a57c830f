//! In-process storage backend.
//!
//! Keeps file contents in a sorted map guarded by a mutex. Folders are
//! tracked explicitly; writing a file registers all of its ancestors.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{File, Folder, Identifier};
use crate::storage::Storage;

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<Identifier, Vec<u8>>,
    folders: BTreeSet<Identifier>,
}

impl Inner {
    fn register_ancestors(&mut self, identifier: &Identifier) {
        let mut current = identifier.parent();
        while let Some(parent) = current {
            current = parent.parent();
            self.folders.insert(parent);
        }
    }
}

/// Storage backend holding everything in memory.
#[derive(Debug)]
pub struct MemoryStorage {
    base_uri: String,
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new(base_uri: impl Into<String>) -> Self {
        let mut inner = Inner::default();
        inner.folders.insert(Identifier::root());
        Self {
            base_uri: base_uri.into(),
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still structurally valid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store bytes at `identifier`, creating parent folders.
    pub fn insert(&self, identifier: Identifier, bytes: impl Into<Vec<u8>>) {
        let mut inner = self.lock();
        inner.register_ancestors(&identifier);
        inner.files.insert(identifier, bytes.into());
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    fn children<'a>(
        items: impl Iterator<Item = &'a Identifier>,
        folder: &Identifier,
    ) -> Vec<Identifier> {
        items
            .filter(|id| id.parent().as_ref() == Some(folder))
            .cloned()
            .collect()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("/")
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    async fn has_file(&self, identifier: &Identifier) -> Result<bool> {
        Ok(self.lock().files.contains_key(identifier))
    }

    async fn has_folder(&self, identifier: &Identifier) -> Result<bool> {
        Ok(self.lock().folders.contains(identifier))
    }

    async fn create_folder(&self, name: &str, parent: &Folder) -> Result<Identifier> {
        let identifier = parent.identifier().join(name)?;
        let mut inner = self.lock();
        if inner.files.contains_key(&identifier) {
            return Err(AppError::transfer(
                identifier.as_str(),
                "a file already exists at this path",
            ));
        }
        inner.register_ancestors(&identifier);
        inner.folders.insert(identifier.clone());
        Ok(identifier)
    }

    async fn copy_file(&self, file: &File, destination: &Identifier) -> Result<()> {
        let bytes = file.contents().await?;
        if self.lock().folders.contains(destination) {
            return Err(AppError::transfer(
                destination.as_str(),
                "a folder already exists at this path",
            ));
        }
        self.insert(destination.clone(), bytes);
        Ok(())
    }

    async fn read_file(&self, identifier: &Identifier) -> Result<Vec<u8>> {
        self.lock()
            .files
            .get(identifier)
            .cloned()
            .ok_or_else(|| AppError::not_found(identifier.as_str()))
    }

    async fn list_files(&self, folder: &Identifier) -> Result<Vec<Identifier>> {
        let inner = self.lock();
        if !inner.folders.contains(folder) {
            return Err(AppError::not_found(folder.as_str()));
        }
        Ok(Self::children(inner.files.keys(), folder))
    }

    async fn list_folders(&self, folder: &Identifier) -> Result<Vec<Identifier>> {
        let inner = self.lock();
        if !inner.folders.contains(folder) {
            return Err(AppError::not_found(folder.as_str()));
        }
        Ok(Self::children(inner.folders.iter(), folder))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_insert_registers_ancestors() {
        let storage = MemoryStorage::default();
        storage.insert(id("/a/b/c.txt"), "c");

        assert!(storage.has_folder(&id("/a")).await.unwrap());
        assert!(storage.has_folder(&id("/a/b")).await.unwrap());
        assert!(storage.has_file(&id("/a/b/c.txt")).await.unwrap());
        assert_eq!(
            storage.list_folders(&Identifier::root()).await.unwrap(),
            vec![id("/a")]
        );
    }

    #[tokio::test]
    async fn test_copy_reads_from_source() {
        let source = Arc::new(MemoryStorage::default());
        source.insert(id("/x.bin"), vec![1, 2, 3]);
        let source: Arc<dyn Storage> = source;
        let target = MemoryStorage::default();

        let file = File::new(id("/x.bin"), source);
        target.copy_file(&file, &id("/out/x.bin")).await.unwrap();

        assert_eq!(target.read_file(&id("/out/x.bin")).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(target.list_files(&id("/out")).await.unwrap(), vec![id("/out/x.bin")]);
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let source: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let target = MemoryStorage::default();

        let file = File::new(id("/ghost.txt"), source);
        let err = target.copy_file(&file, &id("/ghost.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(target.file_count(), 0);
    }
}
