//! Object storage interface for domain files and rasters (MinIO/S3 compatible).

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, memory::InMemory, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "glossis".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl ObjectStorageConfig {
    /// Load configuration from `S3_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `S3_*` environment variables on top of this configuration.
    pub fn with_env_overrides(self) -> Self {
        let mut config = self;
        if let Ok(val) = std::env::var("S3_ENDPOINT") {
            config.endpoint = val;
        }
        if let Ok(val) = std::env::var("S3_BUCKET") {
            config.bucket = val;
        }
        if let Ok(val) = std::env::var("S3_ACCESS_KEY") {
            config.access_key_id = val;
        }
        if let Ok(val) = std::env::var("S3_SECRET_KEY") {
            config.secret_access_key = val;
        }
        if let Ok(val) = std::env::var("S3_REGION") {
            config.region = val;
        }
        if let Ok(val) = std::env::var("S3_ALLOW_HTTP") {
            config.allow_http = val.to_lowercase() == "true" || val == "1";
        }
        config
    }
}

/// Object storage client.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("bucket", &self.bucket)
            .finish()
    }
}

fn store_error(action: &str, path: &str, e: object_store::Error) -> StorageError {
    match e {
        object_store::Error::NotFound { .. } => StorageError::NotFound(path.to_string()),
        other => StorageError::ObjectStore(format!("Failed to {} {}: {}", action, path, other)),
    }
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// A process-local store, used for dry runs and tests.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            bucket: "memory".to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Write bytes to a path in the bucket.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, path = %path))]
    pub async fn put(&self, path: &str, data: Bytes) -> StorageResult<()> {
        let location = Path::from(path);
        debug!(size = data.len(), "Writing object");

        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| store_error("write", path, e))?;

        Ok(())
    }

    /// Read bytes from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get(&self, path: &str) -> StorageResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| store_error("read", path, e))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| store_error("read bytes of", path, e))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    /// Check if an object exists.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        let location = Path::from(path);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(store_error("check", path, e)),
        }
    }

    /// List objects with a given prefix, sorted by path.
    pub async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let mut paths = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        while let Some(meta) = stream
            .try_next()
            .await
            .map_err(|e| store_error("list", prefix, e))?
        {
            paths.push(meta.location.to_string());
        }

        paths.sort();
        Ok(paths)
    }

    /// Copy an object into a local file, creating parent directories.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn download_to(&self, path: &str, local: &std::path::Path) -> StorageResult<u64> {
        let bytes = self.get(path).await?;
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local, &bytes).await?;
        debug!(local = %local.display(), size = bytes.len(), "Downloaded object");
        Ok(bytes.len() as u64)
    }

    /// Upload a local file to `path`.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn upload_from(&self, local: &std::path::Path, path: &str) -> StorageResult<u64> {
        let data = tokio::fs::read(local).await?;
        let size = data.len() as u64;
        self.put(path, Bytes::from(data)).await?;
        Ok(size)
    }
}

/// Path builder for consistent storage layout.
pub struct StoragePath;

impl StoragePath {
    /// Join a prefix and a file name with exactly one `/`.
    pub fn join(prefix: &str, name: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        let name = name.trim_start_matches('/');
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        }
    }

    /// Last path segment of an object path.
    pub fn file_name(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or(path)
    }
}
