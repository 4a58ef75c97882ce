//! Content hashing for audit integrity.
//!
//! Hashes are SHA-256 over JCS (RFC 8785) canonical JSON, rendered as
//! `"sha256:" + lowercase_hex`. A proposal input hashed at creation time can
//! be re-verified against any later-presented payload regardless of the JSON
//! key order the caller used.

use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::crypto::jcs;

/// Hash an opaque JSON-serializable payload.
///
/// # Example
///
/// ```
/// use kilngate_evidence::crypto::content_hash;
/// use serde_json::json;
///
/// let h1 = content_hash(&json!({"batch": "b-7", "kiln": 2})).unwrap();
/// let h2 = content_hash(&json!({"kiln": 2, "batch": "b-7"})).unwrap();
/// assert_eq!(h1, h2);
/// assert!(h1.starts_with("sha256:"));
/// ```
pub fn content_hash<T: Serialize>(value: &T) -> Result<String> {
    let canonical = jcs::to_vec(value)?;
    let digest = Sha256::digest(&canonical);
    Ok(format!("sha256:{}", hex::encode(digest)))
}

/// Order-sensitive chain root over a sequence of event hashes.
///
/// Reordering, dropping, or altering any event in the trail changes the
/// root; third parties can recompute it from the stored events alone.
pub fn chain_root(event_hashes: &[String]) -> String {
    let mut hasher = Sha256::new();
    for hash in event_hashes {
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
