//! Canonical JSON serialization used for HMAC signing.
//!
//! `serde_json`'s default `Serializer` already emits compact output with no
//! insignificant whitespace and separators `,`/`:` — exactly the
//! `separators=(",", ":")` contract the signature protocol requires. No
//! custom formatter is needed; this helper exists so every call site in the
//! workspace goes through one named function instead of reaching for
//! `serde_json::to_vec` ad hoc, which keeps the "one true canonicalization"
//! invariant auditable.

use serde::Serialize;

/// Serializes `value` to its canonical (compact) JSON byte representation.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_no_insignificant_whitespace() {
        let value = serde_json::json!({"event": "user.created", "data": {"id": 123}});
        let bytes = canonical_json(&value).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert!(!s.contains(", "));
        assert!(!s.contains(": "));
    }
}
