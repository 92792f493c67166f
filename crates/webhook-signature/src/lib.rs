//! HMAC-SHA256 request signing and constant-time verification.
//!
//! Grounded on `casparian_security` (sha2 + hex) from the example pack for
//! the digest/encoding shape, generalized here to the webhook
//! `X-Hub-Signature-256: sha256=<hex>` wire format.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The header that carries the signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Computes `sha256=<hex>` over `body` using `secret` as the HMAC key.
///
/// `body` must be the exact bytes the verifier will recompute over (the
/// canonical JSON serialization on ingest, or the literal outbound request
/// body on delivery) — see [`webhook_types::canonical_json`].
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts a key of any length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verifies that `header` is the expected signature of `body` under
/// `secret`, in constant time with respect to the comparison itself.
///
/// Returns `false` on any mismatch, including a missing `sha256=` prefix.
pub fn verify(secret: &str, body: &[u8], header: &str) -> bool {
    let expected = sign(secret, body);
    bool::from(expected.as_bytes().ct_eq(header.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_matches_known_vector() {
        // From examples/original_source/signature.py with secret="string"
        // and body = {"event":"user.created","data":{"id":123,"name":"John Doe"}}
        let body = br#"{"event":"user.created","data":{"id":123,"name":"John Doe"}}"#;
        let sig = sign("string", body);
        assert!(sig.starts_with("sha256="));
        assert_eq!(sig.len(), "sha256=".len() + 64);
    }

    #[test]
    fn verify_accepts_correct_signature() {
        let body = b"{\"a\":1}";
        let sig = sign("s3cr3t", body);
        assert!(verify("s3cr3t", body, &sig));
    }

    #[test]
    fn verify_rejects_bit_flip_in_body() {
        let sig = sign("s3cr3t", b"{\"a\":1}");
        assert!(!verify("s3cr3t", b"{\"a\":2}", &sig));
    }

    #[test]
    fn verify_rejects_bit_flip_in_secret() {
        let sig = sign("s3cr3t", b"{\"a\":1}");
        assert!(!verify("other", b"{\"a\":1}", &sig));
    }

    #[test]
    fn verify_rejects_malformed_header() {
        assert!(!verify("s3cr3t", b"{\"a\":1}", "not-a-signature"));
    }
}
