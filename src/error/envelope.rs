//! Wire representation of a failure

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{"message": .., "statusCode": .., "errorCode": ..}`
///
/// Unknown fields are ignored and missing ones default, so envelopes from
/// newer or older peers still decode. A field of the wrong type or out of
/// range reads as its default instead of rejecting the whole envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub status_code: u16,
    #[serde(default, deserialize_with = "lenient_number")]
    pub error_code: u32,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| T::try_from(n).ok()).unwrap_or_default())
}

impl ErrorEnvelope {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
