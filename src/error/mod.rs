//! Error types shared by every layer of the store
//!
//! `StoreError` is the single tagged error type. Locally raised errors travel
//! up to the HTTP boundary unchanged and are rendered as an [`ErrorEnvelope`];
//! errors received from a peer are rebuilt into the same type through the
//! [`registry::ErrorRegistry`].

pub mod envelope;
pub mod registry;
pub mod remote;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub use envelope::ErrorEnvelope;
pub use registry::{ErrorRegistry, RegistryEntry, RemoteContext};
pub use remote::{decode_remote, decode_remote_response};

/// Prefix of the canonical invalid-range message. Also used to recover the
/// header text from a peer's message.
pub const INVALID_RANGE_PREFIX: &str = "Invalid range request: ";

/// Error code carried by failures that have no registry entry.
pub const UNREGISTERED_CODE: u32 = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Bucket already exists: {bucket}")]
    BucketAlreadyExists { bucket: String },

    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("Key not found: {bucket} : {key}")]
    KeyNotFound { bucket: String, key: String },

    /// The `Range` header does not match the `bytes=` grammar.
    #[error("Invalid range request: {header}")]
    InvalidRangeRequest { header: String },

    /// The header parsed but no spec fits inside the object.
    #[error("Invalid range request: bytes */{content_length}")]
    RangeNotSatisfiable { content_length: u64 },

    #[error("Metadata is too large: {bucket}:{key}")]
    MetaDataTooLarge { bucket: String, key: String },

    #[error("Can not delete file with bucket:{bucket} and key: {key}")]
    LimitedDeleteAccess { bucket: String, key: String },

    #[error("There is no video stream in file: {bucket}:{key}")]
    NoVideoFile { bucket: String, key: String },

    /// A peer failure whose code this process does not know.
    #[error("{message}")]
    Remote {
        message: String,
        status_code: u16,
        error_code: u32,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Stable wire code of this error.
    pub fn error_code(&self) -> u32 {
        match self {
            StoreError::BucketAlreadyExists { .. } => registry::BUCKET_ALREADY_EXISTS,
            StoreError::BucketNotFound { .. } => registry::BUCKET_NOT_FOUND,
            StoreError::KeyNotFound { .. } => registry::KEY_NOT_FOUND,
            StoreError::InvalidRangeRequest { .. } | StoreError::RangeNotSatisfiable { .. } => {
                registry::INVALID_RANGE_REQUEST
            }
            StoreError::MetaDataTooLarge { .. } => registry::META_DATA_TOO_LARGE,
            StoreError::LimitedDeleteAccess { .. } => registry::LIMITED_DELETE_ACCESS,
            StoreError::NoVideoFile { .. } => registry::NO_VIDEO_FILE,
            StoreError::Remote { error_code, .. } => *error_code,
            StoreError::Internal(_) => UNREGISTERED_CODE,
        }
    }

    /// HTTP status written into the envelope. Registered kinds take it from
    /// the registry table.
    pub fn http_status(&self) -> u16 {
        match self {
            StoreError::Remote { status_code, .. } => *status_code,
            StoreError::Internal(_) => 500,
            _ => ErrorRegistry::global()
                .lookup(self.error_code())
                .map(|entry| entry.status)
                .unwrap_or(500),
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.to_string(),
            status_code: self.http_status(),
            error_code: self.error_code(),
        }
    }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let StoreError::RangeNotSatisfiable { content_length } = self {
            builder.insert_header((header::CONTENT_RANGE, format!("bytes */{}", content_length)));
        }
        builder.json(self.to_envelope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_canonical_messages() {
        let err = StoreError::KeyNotFound { bucket: "b".to_string(), key: "k".to_string() };
        assert_eq!(err.to_string(), "Key not found: b : k");

        let err = StoreError::InvalidRangeRequest { header: "bytes=x".to_string() };
        assert_eq!(err.to_string(), "Invalid range request: bytes=x");

        let err = StoreError::RangeNotSatisfiable { content_length: 10 };
        assert_eq!(err.to_string(), "Invalid range request: bytes */10");
    }

    #[test]
    fn test_range_errors_share_family() {
        let malformed = StoreError::InvalidRangeRequest { header: "x".to_string() };
        let unsatisfiable = StoreError::RangeNotSatisfiable { content_length: 0 };
        assert_eq!(malformed.error_code(), unsatisfiable.error_code());
        assert_eq!(malformed.http_status(), 416);
        assert_eq!(unsatisfiable.http_status(), 416);
    }

    #[test]
    fn test_status_follows_registry() {
        let registry = ErrorRegistry::global();
        let err = StoreError::LimitedDeleteAccess { bucket: "b".to_string(), key: "k".to_string() };
        assert_eq!(err.http_status(), registry.lookup(err.error_code()).unwrap().status);
        assert_eq!(StoreError::Internal("boom".to_string()).http_status(), 500);
    }

    #[test]
    fn test_remote_status_out_of_range_renders_500() {
        let err = StoreError::Remote { message: "odd".to_string(), status_code: 0, error_code: 0 };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_error_response_is_envelope() {
        let err = StoreError::BucketNotFound { bucket: "photos".to_string() };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let envelope: ErrorEnvelope = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.error_code, 1002);
        assert_eq!(envelope.status_code, 404);
        assert_eq!(envelope.message, "Bucket not found: photos");
    }

    #[actix_web::test]
    async fn test_unsatisfiable_response_has_content_range() {
        let resp = StoreError::RangeNotSatisfiable { content_length: 42 }.error_response();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers().get(header::CONTENT_RANGE).unwrap(), "bytes */42");
    }
}
