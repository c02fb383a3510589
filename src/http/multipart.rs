//! `multipart/byteranges` bodies for multi-range responses

use bytes::Bytes;
use chrono::Utc;

use crate::range::ResolvedRange;
use crate::storage::ObjectMeta;

/// Layout of one multi-range response. Parts are written in the order given,
/// which is the order the ranges appeared in the request header.
#[derive(Debug, Clone)]
pub struct ByteRangesBody {
    boundary: String,
    part_content_type: String,
    content_length: u64,
}

impl ByteRangesBody {
    pub fn new(boundary: String, part_content_type: String, content_length: u64) -> Self {
        Self { boundary, part_content_type, content_length }
    }

    pub fn for_object(meta: &ObjectMeta) -> Self {
        let part_content_type = meta
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self::new(boundary_for(meta), part_content_type, meta.content_length)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the response `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/byteranges; boundary={}", self.boundary)
    }

    fn part_header(&self, range: &ResolvedRange, first: bool) -> String {
        let delimiter = if first {
            format!("--{}\r\n", self.boundary)
        } else {
            format!("\r\n--{}\r\n", self.boundary)
        };
        format!(
            "{}Content-Type: {}\r\nContent-Range: {}\r\n\r\n",
            delimiter,
            self.part_content_type,
            range.content_range(self.content_length)
        )
    }

    /// Body chunks: a header and the data for each part, then the closing
    /// delimiter.
    pub fn chunks(&self, parts: Vec<(ResolvedRange, Bytes)>) -> Vec<Bytes> {
        let mut chunks = Vec::with_capacity(parts.len() * 2 + 1);
        for (index, (range, data)) in parts.into_iter().enumerate() {
            chunks.push(Bytes::from(self.part_header(&range, index == 0)));
            chunks.push(data);
        }
        chunks.push(Bytes::from(format!("\r\n--{}--\r\n", self.boundary)));
        chunks
    }
}

/// Boundary unique to the object version and the moment of the response
pub fn boundary_for(meta: &ObjectMeta) -> String {
    let seed = format!(
        "{}/{}/{}/{}",
        meta.bucket,
        meta.key,
        meta.etag,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    hex::encode(md5::compute(seed).0)
}
