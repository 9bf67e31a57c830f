//! AWS S3 storage implementation.
//!
//! Identifiers map onto object keys below a key prefix:
//! - File `/a/b.jpg` is stored at `{prefix}/a/b.jpg`
//! - Folders are key prefixes; `create_folder` writes an empty `{key}/`
//!   marker object so empty folders survive listing

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::{File, Folder, Identifier};
use crate::storage::Storage;

/// S3-based storage backend.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
    base_uri: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    ///
    /// Without an explicit base URI the virtual-hosted bucket endpoint is used.
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        base_uri: Option<String>,
    ) -> Self {
        let bucket = bucket.into();
        let prefix = prefix.into().trim_matches('/').to_string();
        let base_uri = base_uri.unwrap_or_else(|| {
            if prefix.is_empty() {
                format!("https://{bucket}.s3.amazonaws.com/")
            } else {
                format!("https://{bucket}.s3.amazonaws.com/{prefix}/")
            }
        });
        Self {
            client,
            bucket,
            prefix,
            base_uri,
        }
    }

    /// Create S3 storage using the default AWS credential chain.
    pub async fn from_env(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        base_uri: Option<String>,
    ) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        Ok(Self::new(client, bucket, prefix, base_uri))
    }

    /// Object key for a file identifier.
    fn key(&self, identifier: &Identifier) -> String {
        if self.prefix.is_empty() {
            identifier.relative().to_string()
        } else if identifier.is_root() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, identifier.relative())
        }
    }

    /// Key prefix that lists the contents of a folder.
    fn folder_key(&self, identifier: &Identifier) -> String {
        let key = self.key(identifier);
        if key.is_empty() { key } else { format!("{key}/") }
    }

    /// Turn an object key back into an identifier.
    fn identifier_for(&self, key: &str) -> Result<Identifier> {
        let relative = if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.prefix).unwrap_or(key)
        };
        Identifier::parse(relative)
    }

    /// List one delimiter level below a folder, following continuation tokens.
    async fn list_level(&self, folder: &Identifier) -> Result<(Vec<String>, Vec<String>)> {
        let prefix = self.folder_key(folder);
        let mut files = Vec::new();
        let mut folders = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .delimiter("/")
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| AppError::S3(e.into_service_error().to_string()))?;

            for object in output.contents() {
                if let Some(key) = object.key() {
                    if key != prefix && !key.ends_with('/') {
                        files.push(key.to_string());
                    }
                }
            }
            for common in output.common_prefixes() {
                if let Some(p) = common.prefix() {
                    folders.push(p.trim_end_matches('/').to_string());
                }
            }

            match output.next_continuation_token() {
                Some(next) => token = Some(next.to_string()),
                None => break,
            }
        }

        Ok((files, folders))
    }

    fn to_identifiers(&self, mut keys: Vec<String>) -> Result<Vec<Identifier>> {
        keys.sort();
        keys.iter().map(|key| self.identifier_for(key)).collect()
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn name(&self) -> &str {
        "s3"
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn location(&self) -> Option<String> {
        Some(format!("s3://{}/{}", self.bucket, self.prefix))
    }

    async fn has_file(&self, identifier: &Identifier) -> Result<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.key(identifier))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn has_folder(&self, identifier: &Identifier) -> Result<bool> {
        if identifier.is_root() {
            return Ok(true);
        }
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(self.folder_key(identifier))
            .max_keys(1)
            .send()
            .await
            .map_err(|e| AppError::S3(e.into_service_error().to_string()))?;

        Ok(!output.contents().is_empty())
    }

    async fn create_folder(&self, name: &str, parent: &Folder) -> Result<Identifier> {
        let identifier = parent.identifier().join(name)?;
        let marker = self.folder_key(&identifier);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&marker)
            .body(ByteStream::from(Vec::new()))
            .send()
            .await
            .map_err(|e| AppError::transfer(identifier.as_str(), e.into_service_error()))?;

        log::info!("Created folder marker s3://{}/{}", self.bucket, marker);
        Ok(identifier)
    }

    async fn copy_file(&self, file: &File, destination: &Identifier) -> Result<()> {
        let bytes = file.contents().await?;
        let key = self.key(destination);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::transfer(destination.as_str(), e.into_service_error()))?;

        log::info!(
            "Copied {} ({} bytes) to s3://{}/{}",
            file.identifier(),
            size,
            self.bucket,
            key
        );
        Ok(())
    }

    async fn read_file(&self, identifier: &Identifier) -> Result<Vec<u8>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(identifier))
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                Ok(bytes.into_bytes().to_vec())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Err(AppError::not_found(identifier.as_str()))
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn list_files(&self, folder: &Identifier) -> Result<Vec<Identifier>> {
        let (files, _) = self.list_level(folder).await?;
        self.to_identifiers(files)
    }

    async fn list_folders(&self, folder: &Identifier) -> Result<Vec<Identifier>> {
        let (_, folders) = self.list_level(folder).await?;
        self.to_identifiers(folders)
    }
}
