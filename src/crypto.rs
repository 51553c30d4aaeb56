//! Webhook authenticity primitives.
//!
//! Creem signs webhook deliveries with HMAC-SHA256 over the raw request body
//! and sends the hex digest in the `creem-signature` header. Verification
//! must compare digests in constant time and must run over the unparsed
//! bytes exactly as received.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `raw` keyed with `secret`, as a lowercase hex string.
pub fn hmac_sha256_hex(secret: &str, raw: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(raw);
    hex::encode(mac.finalize().into_bytes())
}

/// SHA-256 of `raw` as a lowercase hex string. Used as the fallback event
/// key when a webhook payload carries no provider event id.
pub fn sha256_hex(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison.
///
/// The length check is not constant-time, but length is not secret here -
/// a valid signature is always 64 hex chars for SHA-256.
pub fn secure_compare(left: &str, right: &str) -> bool {
    let left = left.as_bytes();
    let right = right.as_bytes();

    if left.len() != right.len() {
        return false;
    }

    left.ct_eq(right).into()
}
