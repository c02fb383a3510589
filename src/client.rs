//! Client for calling another store node
//!
//! Every non-success reply is decoded through the error registry, so a peer's
//! `BucketNotFound` surfaces here as [`StoreError::BucketNotFound`] rather than
//! as a generic transport failure.

use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::PeerConfig;
use crate::error::{decode_remote_response, StoreError};
use crate::http::handlers::BucketInfo;
use crate::storage::{DeleteResult, ObjectMeta, PutResult};

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Internal(format!("Peer request failed: {}", e))
    }
}

/// Turn a peer reply into `Ok(())` or the error the peer raised.
pub fn check_response(
    status: u16,
    body: &[u8],
    bucket: &str,
    key: Option<&str>,
) -> Result<(), StoreError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let err = decode_remote_response(status, body, bucket, key);
    debug!("Peer answered {}: {}", status, err);
    Err(err)
}

pub struct PeerClient {
    base_url: Url,
    http: Client,
}

impl PeerClient {
    pub fn new(base_url: &str, config: &PeerConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Internal(format!("Invalid peer URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Internal(format!("Peer URL {} can not carry a path", base_url)));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { base_url, http })
    }

    /// Base URL with `segments` appended, each one percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn object_url(&self, bucket: &str, key: &str) -> Url {
        self.url(&["objects", bucket, key])
    }

    async fn send(
        &self,
        request: RequestBuilder,
        bucket: &str,
        key: Option<&str>,
    ) -> Result<Bytes, StoreError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        check_response(status, &body, bucket, key)?;
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        bucket: &str,
        key: Option<&str>,
    ) -> Result<T, StoreError> {
        let body = self.send(request, bucket, key).await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!("Unreadable reply from peer {}: {}", self.base_url, e);
            StoreError::Internal(format!("Unreadable peer reply: {}", e))
        })
    }

    fn upload(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> RequestBuilder {
        let mut request = self.http.request(method, self.object_url(bucket, key)).body(data);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        request
    }

    /// Fetch an object, optionally passing a raw `Range` header value
    pub async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<&str>,
    ) -> Result<Bytes, StoreError> {
        let mut request = self.http.get(self.object_url(bucket, key));
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }
        self.send(request, bucket, Some(key)).await
    }

    pub async fn object_meta(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        let request = self.http.get(self.url(&["objects", bucket, key, "meta"]));
        self.send_json(request, bucket, Some(key)).await
    }

    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<PutResult, StoreError> {
        let request = self.upload(Method::PUT, bucket, key, data, content_type);
        self.send_json(request, bucket, Some(key)).await
    }

    /// Append to an object that already exists on the peer
    pub async fn append_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<PutResult, StoreError> {
        let request = self.upload(Method::POST, bucket, key, data, content_type);
        self.send_json(request, bucket, Some(key)).await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteResult, StoreError> {
        let request = self.http.delete(self.object_url(bucket, key));
        self.send_json(request, bucket, Some(key)).await
    }

    pub async fn get_bucket(&self, bucket: &str) -> Result<BucketInfo, StoreError> {
        let request = self.http.get(self.url(&["buckets", bucket]));
        self.send_json(request, bucket, None).await
    }

    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let response = self.http.head(self.url(&["buckets", bucket])).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(decode_remote_response(other.as_u16(), &[], bucket, None)),
        }
    }
}
