//! Registry of stable error codes
//!
//! Every code listed here is a wire contract between nodes: once assigned, a
//! code keeps its meaning forever. New kinds get new codes. The table is built
//! once, on first access, and never mutated afterwards.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

use crate::error::{ErrorEnvelope, StoreError, INVALID_RANGE_PREFIX};

pub const BUCKET_ALREADY_EXISTS: u32 = 1001;
pub const BUCKET_NOT_FOUND: u32 = 1002;
pub const KEY_NOT_FOUND: u32 = 1003;
pub const INVALID_RANGE_REQUEST: u32 = 1004;
pub const META_DATA_TOO_LARGE: u32 = 1005;
pub const LIMITED_DELETE_ACCESS: u32 = 1006;
pub const NO_VIDEO_FILE: u32 = 1007;

/// Local context used to rebuild a peer's error.
#[derive(Debug, Clone, Copy)]
pub struct RemoteContext<'a> {
    pub bucket: &'a str,
    pub key: Option<&'a str>,
    /// Message the peer sent; only consulted where the local side cannot
    /// supply the context itself.
    pub message: &'a str,
}

impl<'a> RemoteContext<'a> {
    fn key_or_empty(&self) -> String {
        self.key.unwrap_or_default().to_string()
    }
}

/// One row of the registry.
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    pub code: u32,
    pub name: &'static str,
    pub status: u16,
    construct: fn(&RemoteContext<'_>) -> StoreError,
}

impl RegistryEntry {
    pub fn construct(&self, context: &RemoteContext<'_>) -> StoreError {
        (self.construct)(context)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("status", &self.status)
            .finish()
    }
}

pub struct ErrorRegistry {
    entries: HashMap<u32, RegistryEntry>,
}

lazy_static! {
    static ref REGISTRY: ErrorRegistry = ErrorRegistry::canonical();
}

fn bucket_already_exists(ctx: &RemoteContext<'_>) -> StoreError {
    StoreError::BucketAlreadyExists { bucket: ctx.bucket.to_string() }
}

fn bucket_not_found(ctx: &RemoteContext<'_>) -> StoreError {
    StoreError::BucketNotFound { bucket: ctx.bucket.to_string() }
}

fn key_not_found(ctx: &RemoteContext<'_>) -> StoreError {
    StoreError::KeyNotFound { bucket: ctx.bucket.to_string(), key: ctx.key_or_empty() }
}

fn invalid_range_request(ctx: &RemoteContext<'_>) -> StoreError {
    let header = ctx.message.strip_prefix(INVALID_RANGE_PREFIX).unwrap_or(ctx.message);
    StoreError::InvalidRangeRequest { header: header.to_string() }
}

fn meta_data_too_large(ctx: &RemoteContext<'_>) -> StoreError {
    StoreError::MetaDataTooLarge { bucket: ctx.bucket.to_string(), key: ctx.key_or_empty() }
}

fn limited_delete_access(ctx: &RemoteContext<'_>) -> StoreError {
    StoreError::LimitedDeleteAccess { bucket: ctx.bucket.to_string(), key: ctx.key_or_empty() }
}

fn no_video_file(ctx: &RemoteContext<'_>) -> StoreError {
    StoreError::NoVideoFile { bucket: ctx.bucket.to_string(), key: ctx.key_or_empty() }
}

impl ErrorRegistry {
    fn canonical() -> Self {
        let rows = [
            RegistryEntry {
                code: BUCKET_ALREADY_EXISTS,
                name: "BucketAlreadyExists",
                status: 409,
                construct: bucket_already_exists,
            },
            RegistryEntry {
                code: BUCKET_NOT_FOUND,
                name: "BucketNotFound",
                status: 404,
                construct: bucket_not_found,
            },
            RegistryEntry {
                code: KEY_NOT_FOUND,
                name: "KeyNotFound",
                status: 404,
                construct: key_not_found,
            },
            RegistryEntry {
                code: INVALID_RANGE_REQUEST,
                name: "InvalidRangeRequest",
                status: 416,
                construct: invalid_range_request,
            },
            // Wire contract inherited from older nodes, see DESIGN.md.
            RegistryEntry {
                code: META_DATA_TOO_LARGE,
                name: "MetaDataTooLarge",
                status: 404,
                construct: meta_data_too_large,
            },
            RegistryEntry {
                code: LIMITED_DELETE_ACCESS,
                name: "LimitedDeleteAccess",
                status: 403,
                construct: limited_delete_access,
            },
            RegistryEntry {
                code: NO_VIDEO_FILE,
                name: "NoVideoFile",
                status: 404,
                construct: no_video_file,
            },
        ];

        Self {
            entries: rows.into_iter().map(|entry| (entry.code, entry)).collect(),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static ErrorRegistry {
        &REGISTRY
    }

    pub fn lookup(&self, code: u32) -> Option<&RegistryEntry> {
        self.entries.get(&code)
    }

    pub fn is_known(&self, code: u32) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn name_of(&self, code: u32) -> Option<&'static str> {
        self.lookup(code).map(|entry| entry.name)
    }

    /// All registered codes, ascending.
    pub fn codes(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.entries.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Rebuild a typed error from a peer's envelope.
    ///
    /// Known codes get the local canonical message; unknown codes come back
    /// as [`StoreError::Remote`] with the envelope preserved verbatim.
    pub fn reconstruct(
        &self,
        envelope: &ErrorEnvelope,
        bucket: &str,
        key: Option<&str>,
    ) -> StoreError {
        match self.lookup(envelope.error_code) {
            Some(entry) => entry.construct(&RemoteContext {
                bucket,
                key,
                message: &envelope.message,
            }),
            None => StoreError::Remote {
                message: envelope.message.clone(),
                status_code: envelope.status_code,
                error_code: envelope.error_code,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RemoteContext<'static> {
        RemoteContext { bucket: "b", key: Some("k"), message: "remote text" }
    }

    #[test]
    fn test_codes_are_the_canonical_set() {
        assert_eq!(ErrorRegistry::global().codes(), vec![1001, 1002, 1003, 1004, 1005, 1006, 1007]);
    }

    #[test]
    fn test_entries_agree_with_constructed_errors() {
        let registry = ErrorRegistry::global();
        for code in registry.codes() {
            let entry = registry.lookup(code).unwrap();
            let err = entry.construct(&context());
            assert_eq!(err.error_code(), code, "code mismatch for {}", entry.name);
            assert_eq!(err.http_status(), entry.status, "status mismatch for {}", entry.name);
        }
    }

    #[test]
    fn test_names() {
        let registry = ErrorRegistry::global();
        assert_eq!(registry.name_of(1002), Some("BucketNotFound"));
        assert_eq!(registry.name_of(1005), Some("MetaDataTooLarge"));
        assert_eq!(registry.name_of(9999), None);
        assert!(!registry.is_known(0));
    }

    #[test]
    fn test_meta_data_too_large_keeps_404() {
        assert_eq!(ErrorRegistry::global().lookup(1005).unwrap().status, 404);
    }

    #[test]
    fn test_reconstruct_uses_local_context() {
        let envelope = ErrorEnvelope {
            message: "Key not found: other : other".to_string(),
            status_code: 404,
            error_code: 1003,
        };
        let err = ErrorRegistry::global().reconstruct(&envelope, "photos", Some("cat.png"));
        assert_eq!(
            err,
            StoreError::KeyNotFound { bucket: "photos".to_string(), key: "cat.png".to_string() }
        );
        assert_eq!(err.to_string(), "Key not found: photos : cat.png");
    }

    #[test]
    fn test_reconstruct_missing_key_is_empty() {
        let envelope = ErrorEnvelope { message: String::new(), status_code: 403, error_code: 1006 };
        let err = ErrorRegistry::global().reconstruct(&envelope, "b", None);
        assert_eq!(
            err,
            StoreError::LimitedDeleteAccess { bucket: "b".to_string(), key: String::new() }
        );
    }

    #[test]
    fn test_reconstruct_range_recovers_header() {
        let envelope = ErrorEnvelope {
            message: "Invalid range request: bytes=9-x".to_string(),
            status_code: 416,
            error_code: 1004,
        };
        let err = ErrorRegistry::global().reconstruct(&envelope, "b", Some("k"));
        assert_eq!(err, StoreError::InvalidRangeRequest { header: "bytes=9-x".to_string() });

        let envelope = ErrorEnvelope {
            message: "odd wording".to_string(),
            status_code: 416,
            error_code: 1004,
        };
        let err = ErrorRegistry::global().reconstruct(&envelope, "b", Some("k"));
        assert_eq!(err, StoreError::InvalidRangeRequest { header: "odd wording".to_string() });
    }

    #[test]
    fn test_reconstruct_unknown_code_is_verbatim() {
        let envelope = ErrorEnvelope {
            message: "quota".to_string(),
            status_code: 429,
            error_code: 2001,
        };
        let err = ErrorRegistry::global().reconstruct(&envelope, "b", None);
        assert_eq!(
            err,
            StoreError::Remote { message: "quota".to_string(), status_code: 429, error_code: 2001 }
        );
    }
}
