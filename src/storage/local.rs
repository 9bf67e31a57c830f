//! Local filesystem storage implementation.
//!
//! Identifiers map onto paths below a root directory. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! sees a half-copied file.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── a/
//! │   └── b.jpg             # identifier /a/b.jpg
//! └── someDir/              # base dir created by a publisher
//!     └── a/
//!         └── b.jpg         # published copy
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{File, Folder, Identifier};
use crate::storage::Storage;

/// Temp files of in-flight writes: `.publish-XXXXXX.part`.
const TEMP_PREFIX: &str = ".publish-";
const TEMP_SUFFIX: &str = ".part";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    base_uri: String,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, base_uri: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_uri: base_uri.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for an identifier.
    fn path(&self, identifier: &Identifier) -> PathBuf {
        self.root_dir.join(identifier.relative())
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// Every write gets its own uniquely named temp file next to the
    /// destination, so concurrent writers of one path never share it. The
    /// temp file is removed when writing or renaming fails.
    pub async fn write_bytes(&self, identifier: &Identifier, bytes: Vec<u8>) -> Result<()> {
        let path = self.path(identifier);
        self.ensure_dir(&path).await?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root_dir.clone());

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .suffix(TEMP_SUFFIX)
                .tempfile_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.flush()?;
            tmp.persist(&path).map_err(|e| AppError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?
    }

    /// List directory entries of one kind below `folder`.
    async fn list_entries(&self, folder: &Identifier, want_dirs: bool) -> Result<Vec<Identifier>> {
        let path = self.path(folder);
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(folder.as_str()));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() != want_dirs || !(file_type.is_dir() || file_type.is_file()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("Skipping non UTF-8 entry in {}", path.display());
                continue;
            };
            names.push(name);
        }

        names.sort();
        names.iter().map(|name| folder.join(name)).collect()
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn name(&self) -> &str {
        "local"
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn location(&self) -> Option<String> {
        Some(format!("file://{}", self.root_dir.display()))
    }

    async fn has_file(&self, identifier: &Identifier) -> Result<bool> {
        match tokio::fs::metadata(self.path(identifier)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn has_folder(&self, identifier: &Identifier) -> Result<bool> {
        match tokio::fs::metadata(self.path(identifier)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn create_folder(&self, name: &str, parent: &Folder) -> Result<Identifier> {
        let identifier = parent.identifier().join(name)?;
        tokio::fs::create_dir_all(self.path(&identifier))
            .await
            .map_err(|e| AppError::transfer(identifier.as_str(), e))?;
        log::debug!("Created folder {} in {}", identifier, self.root_dir.display());
        Ok(identifier)
    }

    async fn copy_file(&self, file: &File, destination: &Identifier) -> Result<()> {
        let bytes = file.contents().await?;
        let size = bytes.len();
        self.write_bytes(destination, bytes)
            .await
            .map_err(|e| AppError::transfer(destination.as_str(), e))?;
        log::debug!(
            "Copied {} ({} bytes) to {}",
            file.identifier(),
            size,
            self.path(destination).display()
        );
        Ok(())
    }

    async fn read_file(&self, identifier: &Identifier) -> Result<Vec<u8>> {
        match tokio::fs::read(self.path(identifier)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(identifier.as_str()))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn list_files(&self, folder: &Identifier) -> Result<Vec<Identifier>> {
        self.list_entries(folder, false).await
    }

    async fn list_folders(&self, folder: &Identifier) -> Result<Vec<Identifier>> {
        self.list_entries(folder, true).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::root_level_folder;
    use tempfile::TempDir;

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "/");

        storage.write_bytes(&id("/test.txt"), b"hello".to_vec()).await.unwrap();
        let data = storage.read_file(&id("/test.txt")).await.unwrap();
        assert_eq!(data, b"hello".to_vec());
        assert!(storage.has_file(&id("/test.txt")).await.unwrap());
        assert!(!storage.has_folder(&id("/test.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "/");

        let err = storage.read_file(&id("/nope.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!storage.has_file(&id("/nope.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_between_storages() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let source: Arc<dyn Storage> = Arc::new(LocalStorage::new(src_dir.path(), "/"));
        let target = LocalStorage::new(dst_dir.path(), "https://cdn.example.com/");

        std::fs::create_dir_all(src_dir.path().join("a")).unwrap();
        std::fs::write(src_dir.path().join("a/b.jpg"), b"jpeg").unwrap();

        let file = File::new(id("/a/b.jpg"), source);
        target.copy_file(&file, &id("/pub/a/b.jpg")).await.unwrap();

        let copied = std::fs::read(dst_dir.path().join("pub/a/b.jpg")).unwrap();
        assert_eq!(copied, b"jpeg");
        let leftovers: Vec<_> = std::fs::read_dir(dst_dir.path().join("pub/a"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("b.jpg")]);
    }

    #[tokio::test]
    async fn test_create_folder_nested() {
        let tmp = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(tmp.path(), "/"));
        let root = root_level_folder(&storage);

        let created = storage.create_folder("/someDir/deeper", &root).await.unwrap();
        assert_eq!(created.as_str(), "/someDir/deeper");
        assert!(tmp.path().join("someDir/deeper").is_dir());

        // Creating it again is fine
        storage.create_folder("someDir", &root).await.unwrap();
    }

    #[tokio::test]
    async fn test_listing_is_sorted_and_split() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "/");

        std::fs::create_dir_all(tmp.path().join("dir/zeta")).unwrap();
        std::fs::create_dir_all(tmp.path().join("dir/alpha")).unwrap();
        std::fs::write(tmp.path().join("dir/b.txt"), b"b").unwrap();
        std::fs::write(tmp.path().join("dir/a.txt"), b"a").unwrap();

        let files = storage.list_files(&id("/dir")).await.unwrap();
        let folders = storage.list_folders(&id("/dir")).await.unwrap();

        assert_eq!(files, vec![id("/dir/a.txt"), id("/dir/b.txt")]);
        assert_eq!(folders, vec![id("/dir/alpha"), id("/dir/zeta")]);
    }

    #[tokio::test]
    async fn test_list_missing_folder() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "/");

        let err = storage.list_files(&id("/missing")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_keeps_tmp_named_user_files() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "/");

        std::fs::create_dir_all(tmp.path().join("d")).unwrap();
        std::fs::write(tmp.path().join("d/a.txt"), b"a").unwrap();
        std::fs::write(tmp.path().join("d/cache.tmp"), b"cache").unwrap();

        let files = storage.list_files(&id("/d")).await.unwrap();
        assert_eq!(files, vec![id("/d/a.txt"), id("/d/cache.tmp")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_backslash_in_name_is_one_segment() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "/");

        std::fs::create_dir_all(tmp.path().join("d")).unwrap();
        std::fs::write(tmp.path().join("d/a\\b.txt"), b"odd").unwrap();

        let files = storage.list_files(&id("/d")).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].as_str(), "/d/a\\b.txt");
        assert_eq!(storage.read_file(&files[0]).await.unwrap(), b"odd");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_same_path() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path(), "/"));
        let payload = vec![7u8; 1 << 20];

        let mut handles = Vec::new();
        for _ in 0..8 {
            let storage = Arc::clone(&storage);
            let payload = payload.clone();
            handles.push(tokio::spawn(async move {
                storage.write_bytes(&id("/big.bin"), payload).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(std::fs::read(tmp.path().join("big.bin")).unwrap(), payload);
        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_same_root_is_same_storage() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let a: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path(), "/"));
        let b: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path(), "https://cdn.example.com/"));
        let c: Arc<dyn Storage> = Arc::new(LocalStorage::new(other.path(), "/"));

        assert!(crate::storage::same_storage(&a, &Arc::clone(&a)));
        assert!(crate::storage::same_storage(&a, &b));
        assert!(!crate::storage::same_storage(&a, &c));
    }
}
