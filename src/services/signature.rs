//! HMAC-SHA256 signing for QR payloads

use ring::hmac;

/// Signs a payload and returns the signature as a hex string
pub fn sign(payload: &str, key: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, payload.as_bytes());
    hex::encode(tag.as_ref())
}

/// Verifies a hex signature against a payload
pub fn verify(payload: &str, signature: &str, key: &[u8]) -> bool {
    let Ok(signature_bytes) = hex::decode(signature) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::verify(&key, payload.as_bytes(), &signature_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signature = sign("payload", b"key");
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(verify("payload", &signature, b"key"));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signature = sign("payload", b"key");
        assert!(!verify("payload2", &signature, b"key"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signature = sign("payload", b"key");
        assert!(!verify("payload", &signature, b"other-key"));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(!verify("payload", "not-hex", b"key"));
        assert!(!verify("payload", "", b"key"));
    }
}
