//! Object Storage Layer Abstraction
//!
//! This module provides an abstraction over object storage backends,
//! allowing the HTTP layer to serve buckets and keys without knowing how
//! the bytes are kept.

pub mod memory_store;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StoreError;
use crate::range::ResolvedRange;

/// Metadata kept alongside every stored object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub bucket: String,
    pub key: String,
    /// Object size in bytes
    pub content_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Hex MD5 of the object body
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    /// User supplied properties (`X-Blobvault-Meta-*` headers)
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Reply to a successful PUT
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PutResult {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub etag: String,
}

/// Reply to a successful DELETE
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteResult {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

/// Trait defining the object storage interface
pub trait ObjectStore: Send + Sync {
    /// Check whether a bucket is available
    fn bucket_exists(&self, bucket: &str) -> bool;

    /// List the keys of a bucket, sorted
    fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StoreError>;

    /// Retrieve metadata for an object
    fn object_meta(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Read the whole object
    fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    /// Read one resolved window of an object
    fn read_range(
        &self,
        bucket: &str,
        key: &str,
        range: &ResolvedRange,
    ) -> Result<Bytes, StoreError>;

    /// Store an object, replacing any previous one under the same key
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
        properties: HashMap<String, String>,
    ) -> Result<ObjectMeta, StoreError>;

    /// Append to an existing object. Given properties are merged over the
    /// stored ones and a given content type replaces the stored one.
    fn append_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
        properties: HashMap<String, String>,
    ) -> Result<ObjectMeta, StoreError>;

    /// Delete an object and return its size
    fn delete_object(&self, bucket: &str, key: &str) -> Result<u64, StoreError>;
}
