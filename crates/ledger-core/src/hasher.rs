//! Canonical block encoding and digest.
//!
//! The encoding is a compact JSON object whose keys appear in sorted order. Field order is
//! fixed by the declaration order of [`CanonicalBlock`], not by any map implementation, so
//! the bytes are stable across serde_json feature sets. The seal hash is never part of it.

use crate::constants::ENCODING_VERSION;
use crate::Hash;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Serialize)]
struct CanonicalBlock<'a> {
    index: u64,
    nonce: u64,
    previous_hash: &'a str,
    timestamp: f64,
    transactions: &'a [String],
    version: u32,
}

/// Encodes the committed fields of a block.
pub fn canonical_bytes(
    index: u64,
    transactions: &[String],
    timestamp: f64,
    previous_hash: &str,
    nonce: u64,
) -> Vec<u8> {
    let canonical = CanonicalBlock {
        index,
        nonce,
        previous_hash,
        timestamp,
        transactions,
        version: ENCODING_VERSION,
    };
    serde_json::to_vec(&canonical).expect("canonical block encoding is infallible")
}

pub fn digest(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// SHA-256 of `bytes` as 64 lowercase hex characters.
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(digest(bytes))
}
