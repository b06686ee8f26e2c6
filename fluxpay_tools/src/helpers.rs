use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the base64 HMAC-SHA256 signature of a payload.
///
/// The webhook contract is signed over the *raw request body bytes*. Re-serializing a parsed value changes
/// whitespace and key order and will produce a different digest, so callers must pass the bytes exactly as they
/// arrived on the wire.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    base64::encode(mac.finalize().into_bytes())
}

/// Verify a provider-supplied signature against the raw body. The comparison is byte-exact on the base64 encoding.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    sign_payload(secret, payload) == signature
}

#[cfg(test)]
mod test {
    use super::*;

    // Vector generated with `echo -n '{"data":{"status":"successful"}}' | openssl dgst -sha256 -hmac topsecret -binary | base64`
    const BODY: &[u8] = br#"{"data":{"status":"successful"}}"#;
    const SIGNATURE: &str = "raJnCkS2OMyFfaIJMecGj3eCsytEgvj3eLXlN1r3OJ4=";

    #[test]
    fn sign_payload_matches_openssl_vector() {
        assert_eq!(sign_payload("topsecret", BODY), SIGNATURE);
    }

    #[test]
    fn verify_signature_accepts_exact_match_only() {
        assert!(verify_signature("topsecret", BODY, SIGNATURE));
        assert!(!verify_signature("topsecret", BODY, "bm90IGEgc2lnbmF0dXJl"));
        assert!(!verify_signature("othersecret", BODY, SIGNATURE));
        // Whitespace changes to the body must break the signature.
        assert!(!verify_signature("topsecret", br#"{ "data": {"status":"successful"} }"#, SIGNATURE));
    }
}
