//! Decoder for the `Range` request header
//!
//! Accepted shape, with no whitespace anywhere:
//!
//! ```text
//! bytes=<spec>(,<spec>)*
//! <spec> = <digits>-<digits>?  |  -<digits>
//! ```

use crate::error::StoreError;

const BYTES_UNIT_PREFIX: &str = "bytes=";

/// One range as written by the client, before the object size is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawRangeSpec {
    /// `start-end` or `start-`; a missing end reads to the end of the object.
    Explicit { start: u64, end: Option<u64> },
    /// `-length`: the last `length` bytes.
    Suffix { length: u64 },
}

/// Decode a raw header value into range specs, in header order.
pub fn decode(header: &str) -> Result<Vec<RawRangeSpec>, StoreError> {
    let invalid = || StoreError::InvalidRangeRequest { header: header.to_string() };

    let range_set = header.strip_prefix(BYTES_UNIT_PREFIX).ok_or_else(invalid)?;
    if range_set.is_empty() {
        return Err(invalid());
    }

    range_set
        .split(',')
        .map(|spec| decode_spec(spec).ok_or_else(invalid))
        .collect()
}

fn decode_spec(spec: &str) -> Option<RawRangeSpec> {
    let (first, last) = spec.split_once('-')?;

    if first.is_empty() {
        return decode_digits(last).map(|length| RawRangeSpec::Suffix { length });
    }

    let start = decode_digits(first)?;
    let end = if last.is_empty() { None } else { Some(decode_digits(last)?) };
    Some(RawRangeSpec::Explicit { start, end })
}

/// ASCII digits only; `str::parse` alone would also accept a leading `+`.
/// Overflow of `u64` is a decode failure.
fn decode_digits(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
