// Object and bucket request handlers
use actix_web::body::SizedStream;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::app_state::AppState;
use crate::error::StoreError;
use crate::http::multipart::ByteRangesBody;
use crate::range::{self, ResolvedRange};
use crate::storage::{DeleteResult, ObjectMeta, PutResult};

/// Header prefix carrying user properties of an object
pub const META_HEADER_PREFIX: &str = "x-blobvault-meta-";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Reply to `GET /buckets/{bucket}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketInfo {
    pub name: String,
    pub objects: Vec<String>,
}

/// Put bucket and key into the logging MDC until the guard is dropped
fn tag_request(bucket: &str, key: Option<&str>) -> log_mdc::ExtendGuard {
    log_mdc::extend_scoped([("bucket", bucket), ("key", key.unwrap_or("-"))])
}

fn http_date(meta: &ObjectMeta) -> String {
    meta.last_modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn apply_object_headers(builder: &mut HttpResponseBuilder, meta: &ObjectMeta) {
    builder
        .insert_header((header::ACCEPT_RANGES, "bytes"))
        .insert_header((header::ETAG, format!("\"{}\"", meta.etag)))
        .insert_header((header::LAST_MODIFIED, http_date(meta)));
    for (name, value) in &meta.properties {
        builder.insert_header((format!("{}{}", META_HEADER_PREFIX, name), value.as_str()));
    }
}

fn content_type_of(meta: &ObjectMeta) -> &str {
    meta.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn range_header(req: &HttpRequest) -> Result<Option<String>, StoreError> {
    match req.headers().get(header::RANGE) {
        None => Ok(None),
        Some(value) => value.to_str().map(|v| Some(v.to_string())).map_err(|_| {
            StoreError::InvalidRangeRequest {
                header: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            }
        }),
    }
}

fn properties_from_headers(req: &HttpRequest) -> HashMap<String, String> {
    req.headers()
        .iter()
        .filter_map(|(name, value)| {
            let property = name.as_str().strip_prefix(META_HEADER_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((property.to_string(), value.to_string()))
        })
        .collect()
}

/// Handles requests like: GET /objects/{bucket}/{key}
///
/// Without a `Range` header the whole object is returned. A satisfiable
/// range yields 206, either single part or `multipart/byteranges` with the
/// parts in header order.
pub async fn get_object_handler(
    path: web::Path<(String, String)>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let _mdc = tag_request(&bucket, Some(&key));
    debug!("GET object: bucket={}, key={}", bucket, key);

    let store = &app_state.store;
    let meta = store.object_meta(&bucket, &key)?;

    let header_value = match range_header(&req)? {
        Some(value) => value,
        None => {
            let data = store.read_object(&bucket, &key)?;
            let mut builder = HttpResponse::Ok();
            apply_object_headers(&mut builder, &meta);
            return Ok(builder.content_type(content_type_of(&meta)).body(data));
        }
    };

    let specs = range::decode(&header_value)?;
    let max_ranges = app_state.config.range.max_ranges;
    if specs.len() > max_ranges {
        warn!("Range header names {} ranges, limit is {}", specs.len(), max_ranges);
        return Err(StoreError::InvalidRangeRequest { header: header_value });
    }

    let windows = range::resolve(&specs, meta.content_length)?;
    debug!("Resolved {} into {:?}", header_value, windows);

    let mut builder = HttpResponse::PartialContent();
    apply_object_headers(&mut builder, &meta);

    if let [window] = windows.as_slice() {
        let data = store.read_range(&bucket, &key, window)?;
        return Ok(builder
            .content_type(content_type_of(&meta))
            .insert_header((header::CONTENT_RANGE, window.content_range(meta.content_length)))
            .body(data));
    }

    let parts = windows
        .iter()
        .map(|window| -> Result<(ResolvedRange, Bytes), StoreError> {
            Ok((*window, store.read_range(&bucket, &key, window)?))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    let body = ByteRangesBody::for_object(&meta);
    info!("Serving {} ranges of {}/{}", parts.len(), bucket, key);

    let chunks = body.chunks(parts);
    Ok(builder
        .content_type(body.content_type())
        .streaming(stream::iter(chunks.into_iter().map(Ok::<Bytes, StoreError>))))
}

/// Handles requests like: HEAD /objects/{bucket}/{key}
pub async fn head_object_handler(
    path: web::Path<(String, String)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let _mdc = tag_request(&bucket, Some(&key));
    debug!("HEAD object: bucket={}, key={}", bucket, key);

    let meta = app_state.store.object_meta(&bucket, &key)?;
    let mut builder = HttpResponse::Ok();
    apply_object_headers(&mut builder, &meta);
    // The encoder takes the length from the body, so HEAD carries a sized,
    // empty stream.
    let body = SizedStream::new(meta.content_length, stream::empty::<Result<Bytes, StoreError>>());
    Ok(builder
        .content_type(content_type_of(&meta))
        .no_chunking(meta.content_length)
        .body(body))
}

/// Handles requests like: GET /objects/{bucket}/{key}/meta
pub async fn object_meta_handler(
    path: web::Path<(String, String)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let _mdc = tag_request(&bucket, Some(&key));
    debug!("GET object meta: bucket={}, key={}", bucket, key);

    let meta = app_state.store.object_meta(&bucket, &key)?;
    Ok(HttpResponse::Ok().json(meta))
}

async fn read_payload(
    mut payload: web::Payload,
    bucket: &str,
    key: &str,
) -> Result<Bytes, StoreError> {
    let mut bytes = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            warn!("Error reading payload chunk for {}/{}: {}", bucket, key, e);
            StoreError::Internal(format!("Error reading payload: {}", e))
        })?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes.freeze())
}

fn content_type_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn put_reply(meta: ObjectMeta) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::ETAG, format!("\"{}\"", meta.etag)))
        .json(PutResult {
            bucket: meta.bucket,
            key: meta.key,
            size: meta.content_length,
            etag: meta.etag,
        })
}

/// Handles requests like: PUT /objects/{bucket}/{key}
pub async fn put_object_handler(
    path: web::Path<(String, String)>,
    payload: web::Payload,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let data = read_payload(payload, &bucket, &key).await?;

    // Another request may run on this worker while the payload is awaited.
    let _mdc = tag_request(&bucket, Some(&key));
    debug!("PUT object: bucket={}, key={}, {} bytes", bucket, key, data.len());

    let content_type = content_type_header(&req);
    let properties = properties_from_headers(&req);
    let meta = app_state
        .store
        .put_object(&bucket, &key, data, content_type, properties)?;
    Ok(put_reply(meta))
}

/// Handles requests like: POST /objects/{bucket}/{key}
///
/// Appends the body to an existing object.
pub async fn append_object_handler(
    path: web::Path<(String, String)>,
    payload: web::Payload,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let data = read_payload(payload, &bucket, &key).await?;

    let _mdc = tag_request(&bucket, Some(&key));
    debug!("APPEND object: bucket={}, key={}, {} bytes", bucket, key, data.len());

    let content_type = content_type_header(&req);
    let properties = properties_from_headers(&req);
    let meta = app_state
        .store
        .append_object(&bucket, &key, data, content_type, properties)?;
    Ok(put_reply(meta))
}

/// Handles requests like: DELETE /objects/{bucket}/{key}
pub async fn delete_object_handler(
    path: web::Path<(String, String)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let _mdc = tag_request(&bucket, Some(&key));
    debug!("DELETE object: bucket={}, key={}", bucket, key);

    let size = app_state.store.delete_object(&bucket, &key)?;
    Ok(HttpResponse::Ok().json(DeleteResult { bucket, key, size }))
}

/// Handles requests like: HEAD /buckets/{bucket}
pub async fn head_bucket_handler(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> HttpResponse {
    let bucket = path.into_inner();
    let _mdc = tag_request(&bucket, None);

    if app_state.store.bucket_exists(&bucket) {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::NotFound().finish()
    }
}

/// Handles requests like: GET /buckets/{bucket}
pub async fn get_bucket_handler(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, StoreError> {
    let bucket = path.into_inner();
    let _mdc = tag_request(&bucket, None);
    debug!("GET bucket: bucket={}", bucket);

    let objects = app_state.store.list_keys(&bucket)?;
    Ok(HttpResponse::Ok().json(BucketInfo { name: bucket, objects }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdc_value(name: &str) -> Option<String> {
        log_mdc::get(name, |value| value.map(str::to_string))
    }

    #[test]
    fn test_request_tags_are_scoped() {
        {
            let _mdc = tag_request("photos", Some("cat.png"));
            assert_eq!(mdc_value("bucket").as_deref(), Some("photos"));
            assert_eq!(mdc_value("key").as_deref(), Some("cat.png"));
        }
        assert_eq!(mdc_value("bucket"), None);
        assert_eq!(mdc_value("key"), None);

        let _mdc = tag_request("photos", None);
        assert_eq!(mdc_value("key").as_deref(), Some("-"));
    }
}
