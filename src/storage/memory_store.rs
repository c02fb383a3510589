//! In-memory implementation of the ObjectStore trait

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::range::ResolvedRange;
use crate::storage::{ObjectMeta, ObjectStore};

struct StoredObject {
    data: Bytes,
    meta: ObjectMeta,
}

type Buckets = HashMap<String, HashMap<String, StoredObject>>;

/// In-memory object store: bucket -> key -> object
pub struct MemoryObjectStore {
    buckets: RwLock<Buckets>,
    protected: HashSet<String>,
}

impl MemoryObjectStore {
    /// Create a store with the configured buckets already present
    pub fn from_config(config: &StorageConfig) -> Self {
        let buckets = config
            .buckets
            .iter()
            .chain(config.protected_buckets.iter())
            .map(|bucket| (bucket.clone(), HashMap::new()))
            .collect();
        info!(
            "Memory store starting with buckets {:?} (protected: {:?})",
            config.buckets, config.protected_buckets
        );

        Self {
            buckets: RwLock::new(buckets),
            protected: config.protected_buckets.iter().cloned().collect(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Buckets>, StoreError> {
        self.buckets
            .read()
            .map_err(|_| StoreError::Internal("object store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Buckets>, StoreError> {
        self.buckets
            .write()
            .map_err(|_| StoreError::Internal("object store lock poisoned".to_string()))
    }

    fn with_object<T>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&StoredObject) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let buckets = self.read()?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        let object = objects.get(key).ok_or_else(|| StoreError::KeyNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        f(object)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn bucket_exists(&self, bucket: &str) -> bool {
        self.read().map(|buckets| buckets.contains_key(bucket)).unwrap_or(false)
    }

    fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        let buckets = self.read()?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn object_meta(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        self.with_object(bucket, key, |object| Ok(object.meta.clone()))
    }

    fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        self.with_object(bucket, key, |object| Ok(object.data.clone()))
    }

    fn read_range(
        &self,
        bucket: &str,
        key: &str,
        range: &ResolvedRange,
    ) -> Result<Bytes, StoreError> {
        self.with_object(bucket, key, |object| {
            let content_length = object.data.len() as u64;
            if range.start > range.end || range.end >= content_length {
                warn!("Range {:?} outside {}/{} of length {}", range, bucket, key, content_length);
                return Err(StoreError::RangeNotSatisfiable { content_length });
            }
            debug!("Reading {} from {}/{}", range.content_range(content_length), bucket, key);
            Ok(object.data.slice(range.start as usize..=range.end as usize))
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
        properties: HashMap<String, String>,
    ) -> Result<ObjectMeta, StoreError> {
        let meta = ObjectMeta {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_length: data.len() as u64,
            content_type,
            etag: hex::encode(md5::compute(&data).0),
            last_modified: Utc::now(),
            properties,
        };

        let mut buckets = self.write()?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        if objects
            .insert(key.to_string(), StoredObject { data, meta: meta.clone() })
            .is_some()
        {
            debug!("Overwrote existing object {}/{}", bucket, key);
        }
        info!("Stored {}/{} ({} bytes)", bucket, key, meta.content_length);
        Ok(meta)
    }

    fn append_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
        properties: HashMap<String, String>,
    ) -> Result<ObjectMeta, StoreError> {
        let mut buckets = self.write()?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        let object = objects.get_mut(key).ok_or_else(|| StoreError::KeyNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        let mut combined = BytesMut::with_capacity(object.data.len() + data.len());
        combined.extend_from_slice(&object.data);
        combined.extend_from_slice(&data);
        object.data = combined.freeze();

        let meta = &mut object.meta;
        meta.content_length = object.data.len() as u64;
        meta.etag = hex::encode(md5::compute(&object.data).0);
        meta.last_modified = Utc::now();
        if content_type.is_some() {
            meta.content_type = content_type;
        }
        meta.properties.extend(properties);

        info!("Appended {} bytes to {}/{} (now {})", data.len(), bucket, key, meta.content_length);
        Ok(meta.clone())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<u64, StoreError> {
        let mut buckets = self.write()?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        if self.protected.contains(bucket) {
            warn!("Refusing delete of {}/{} in protected bucket", bucket, key);
            return Err(StoreError::LimitedDeleteAccess {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let object = objects.remove(key).ok_or_else(|| StoreError::KeyNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        info!("Deleted {}/{}", bucket, key);
        Ok(object.meta.content_length)
    }
}
