//! Object storage for domain files and output rasters.
//!
//! Wraps an S3-compatible bucket (MinIO in local deployments) or an
//! in-memory store, and moves whole objects between the bucket and local
//! scratch files.

pub mod error;
pub mod object_store;

pub use self::error::{StorageError, StorageResult};
pub use self::object_store::{ObjectStorage, ObjectStorageConfig, StoragePath};
