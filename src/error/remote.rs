//! Decoding of error envelopes received from peers

use log::{debug, warn};

use crate::error::{ErrorEnvelope, ErrorRegistry, StoreError, UNREGISTERED_CODE};

/// Status reported when a peer's error body is not an envelope at all.
pub const MALFORMED_ENVELOPE_STATUS: u16 = 502;

/// Rebuild the error a peer raised from its response body.
///
/// Never fails: unknown codes and unreadable bodies both degrade to
/// [`StoreError::Remote`].
pub fn decode_remote(body: &[u8], bucket: &str, key: Option<&str>) -> StoreError {
    decode_remote_response(MALFORMED_ENVELOPE_STATUS, body, bucket, key)
}

/// Same as [`decode_remote`], but an unreadable body keeps the HTTP status
/// the peer actually answered with.
pub fn decode_remote_response(
    status: u16,
    body: &[u8],
    bucket: &str,
    key: Option<&str>,
) -> StoreError {
    match ErrorEnvelope::from_slice(body) {
        Ok(envelope) => {
            let registry = ErrorRegistry::global();
            match registry.name_of(envelope.error_code) {
                Some(name) => {
                    debug!("Peer reported {} ({}) for bucket={}", name, envelope.error_code, bucket)
                }
                None => warn!(
                    "Peer reported unknown error code {} with status {}: {}",
                    envelope.error_code, envelope.status_code, envelope.message
                ),
            }
            registry.reconstruct(&envelope, bucket, key)
        }
        Err(e) => {
            warn!("Peer answered {} with a body that is not an error envelope: {}", status, e);
            StoreError::Remote {
                message: String::from_utf8_lossy(body).into_owned(),
                status_code: status,
                error_code: UNREGISTERED_CODE,
            }
        }
    }
}
