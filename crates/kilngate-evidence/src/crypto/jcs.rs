//! JSON Canonicalization Scheme (RFC 8785).
//!
//! Every digest in this crate is computed over JCS canonical bytes, which
//! guarantees:
//!
//! - Lexicographic key ordering
//! - No insignificant whitespace
//! - UTF-8 encoding
//! - IEEE 754 number normalization (1.0 → 1)
//!
//! Two payloads that differ only in JSON key order therefore hash the same.

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize a value to JCS canonical JSON bytes.
///
/// # Example
///
/// ```
/// use kilngate_evidence::crypto::jcs;
/// use serde_json::json;
///
/// let value = json!({"b": 2, "a": 1});
/// let bytes = jcs::to_vec(&value).unwrap();
/// assert_eq!(bytes, br#"{"a":1,"b":2}"#);
/// ```
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_jcs::to_vec(value).context("failed to serialize canonical json")
}

/// Serialize a value to a JCS canonical JSON string.
pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    serde_jcs::to_string(value).context("failed to serialize canonical json string")
}
