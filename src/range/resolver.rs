//! Resolution of range specs against an object's length

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::range::RawRangeSpec;

/// Inclusive byte window inside one object: `start <= end < content_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
}

impl ResolvedRange {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value, e.g. `bytes 0-499/1000`.
    pub fn content_range(&self, content_length: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, content_length)
    }

    pub fn as_spec(&self) -> RawRangeSpec {
        RawRangeSpec::Explicit { start: self.start, end: Some(self.end) }
    }
}

/// Resolve a single spec; `None` when it cannot be satisfied.
pub fn resolve_one(spec: &RawRangeSpec, content_length: u64) -> Option<ResolvedRange> {
    if content_length == 0 {
        return None;
    }
    let last = content_length - 1;

    match *spec {
        RawRangeSpec::Explicit { start, end } => {
            if start >= content_length {
                return None;
            }
            let end = end.map_or(last, |end| end.min(last));
            if end < start {
                return None;
            }
            Some(ResolvedRange { start, end })
        }
        RawRangeSpec::Suffix { length: 0 } => None,
        RawRangeSpec::Suffix { length } => Some(ResolvedRange {
            start: content_length.saturating_sub(length),
            end: last,
        }),
    }
}

/// Resolve every spec independently, preserving header order.
///
/// Unsatisfiable specs are dropped; the call fails only when none remain.
/// Overlapping or adjacent windows are returned as given.
pub fn resolve(
    specs: &[RawRangeSpec],
    content_length: u64,
) -> Result<Vec<ResolvedRange>, StoreError> {
    let resolved: Vec<ResolvedRange> = specs
        .iter()
        .filter_map(|spec| resolve_one(spec, content_length))
        .collect();

    if resolved.is_empty() {
        return Err(StoreError::RangeNotSatisfiable { content_length });
    }
    Ok(resolved)
}
