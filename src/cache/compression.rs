//! Cache Compression Support
//!
//! LZ4 compression of oversized values, wrapped in a self-describing JSON
//! envelope so reads can detect and reverse it without external bookkeeping.
//!
//! # Envelope format
//!
//! ```json
//! {
//!   "__compressed": true,
//!   "codec": "lz4",
//!   "payload": "<base64 LZ4 block>",
//!   "original_size": 2048
//! }
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Serialized size above which values are compressed (1KB)
pub const COMPRESSION_THRESHOLD_BYTES: u64 = 1024;

/// Reversible transform for oversized values
#[derive(Debug, Clone)]
pub struct CompressionCodec {
    threshold: u64,
    level: i32,
}

impl CompressionCodec {
    /// Create a codec with the default threshold
    pub fn new() -> Self {
        Self {
            threshold: COMPRESSION_THRESHOLD_BYTES,
            level: 4,
        }
    }

    /// Create with a custom threshold
    pub fn with_threshold(threshold: u64) -> Self {
        Self {
            threshold,
            level: 4,
        }
    }

    /// Size threshold in bytes
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Whether a value of the given serialized size qualifies for compression
    pub fn should_compress(&self, serialized_len: u64) -> bool {
        serialized_len > self.threshold
    }

    /// Detect the envelope
    pub fn is_compressed(value: &Value) -> bool {
        value
            .get("__compressed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Compress a value into the envelope
    pub fn compress(&self, value: &Value) -> Result<Value> {
        let raw = serde_json::to_vec(value)?;

        let compressed = lz4::block::compress(
            &raw,
            Some(lz4::block::CompressionMode::HIGHCOMPRESSION(self.level)),
            true,
        )
        .map_err(|e| Error::CompressionFailed {
            algorithm: "LZ4".into(),
            reason: e.to_string(),
        })?;

        Ok(json!({
            "__compressed": true,
            "codec": "lz4",
            "payload": BASE64.encode(&compressed),
            "original_size": raw.len() as u64,
        }))
    }

    /// Reverse the envelope back to the original value
    pub fn decompress(&self, value: &Value) -> Result<Value> {
        let payload = value
            .get("payload")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::DecompressionFailed {
                algorithm: "LZ4".into(),
                reason: "envelope has no payload field".to_string(),
            })?;

        let compressed = BASE64
            .decode(payload)
            .map_err(|e| Error::DecompressionFailed {
                algorithm: "LZ4".into(),
                reason: format!("payload is not valid base64: {}", e),
            })?;

        let raw =
            lz4::block::decompress(&compressed, None).map_err(|e| Error::DecompressionFailed {
                algorithm: "LZ4".into(),
                reason: e.to_string(),
            })?;

        Ok(serde_json::from_slice(&raw)?)
    }
}

impl Default for CompressionCodec {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn large_value() -> Value {
        // Repetitive text well past the threshold, compresses well
        json!({
            "rows": vec!["Hello, this is test data that should compress well."; 50]
        })
    }

    #[test]
    fn test_roundtrip() {
        let codec = CompressionCodec::new();
        let value = large_value();

        let envelope = codec.compress(&value).unwrap();
        assert!(CompressionCodec::is_compressed(&envelope));

        let restored = codec.decompress(&envelope).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_envelope_is_self_describing() {
        let codec = CompressionCodec::new();
        let envelope = codec.compress(&large_value()).unwrap();

        assert_eq!(envelope.get("codec").and_then(Value::as_str), Some("lz4"));
        assert!(envelope.get("original_size").and_then(Value::as_u64).unwrap() > 0);
    }

    #[test]
    fn test_plain_values_are_not_flagged() {
        assert!(!CompressionCodec::is_compressed(&json!(42)));
        assert!(!CompressionCodec::is_compressed(&json!({"payload": "x"})));
        assert!(!CompressionCodec::is_compressed(
            &json!({"__compressed": false})
        ));
    }

    #[test]
    fn test_threshold() {
        let codec = CompressionCodec::new();
        assert!(!codec.should_compress(1024));
        assert!(codec.should_compress(1025));
    }

    #[test]
    fn test_missing_payload_is_hard_error() {
        let codec = CompressionCodec::new();
        let corrupt = json!({"__compressed": true, "codec": "lz4"});

        assert_matches!(
            codec.decompress(&corrupt),
            Err(crate::error::Error::DecompressionFailed { .. })
        );
    }

    #[test]
    fn test_corrupt_payload_is_hard_error() {
        let codec = CompressionCodec::new();
        let corrupt = json!({
            "__compressed": true,
            "codec": "lz4",
            "payload": "not base64 at all!!!",
        });

        assert_matches!(
            codec.decompress(&corrupt),
            Err(crate::error::Error::DecompressionFailed { .. })
        );
    }

    #[test]
    fn test_compresses_repetitive_data() {
        let codec = CompressionCodec::new();
        let value = large_value();
        let raw_len = serde_json::to_vec(&value).unwrap().len();

        let envelope = codec.compress(&value).unwrap();
        let payload_len = envelope
            .get("payload")
            .and_then(Value::as_str)
            .unwrap()
            .len();

        assert!(payload_len < raw_len);
    }
}
