use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::credential::VerifiableCredential;
use crate::services::qr_generator::CertificatePayload;

#[derive(thiserror::Error, Debug)]
pub enum VerificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerificationResult {
    Valid {
        credential: VerifiableCredential,
        certificate: CertificatePayload,
    },
    Revoked {
        credential: VerifiableCredential,
    },
    NotFound {
        credential_id: Uuid,
    },
    InvalidSignature,
    InvalidPayload {
        error: String,
    },
}

impl VerificationResult {
    /// Returns the result type as a string for logging and API responses
    pub fn result_type(&self) -> &'static str {
        match self {
            VerificationResult::Valid { .. } => "valid",
            VerificationResult::Revoked { .. } => "revoked",
            VerificationResult::NotFound { .. } => "not_found",
            VerificationResult::InvalidSignature => "invalid_signature",
            VerificationResult::InvalidPayload { .. } => "invalid_payload",
        }
    }
}

/// Parses a scanned payload string and checks its signature.
///
/// Failures come back as the verification outcome to report, not as errors.
fn authenticate_payload(
    raw_payload: &str,
    signing_key: &[u8],
) -> Result<CertificatePayload, VerificationResult> {
    let payload: CertificatePayload = match serde_json::from_str(raw_payload) {
        Ok(p) => p,
        Err(e) => {
            return Err(VerificationResult::InvalidPayload {
                error: format!("Invalid JSON: {}", e),
            });
        }
    };

    let Some(ref sig) = payload.signature else {
        return Err(VerificationResult::InvalidSignature);
    };

    if !payload.verify_signature(sig, signing_key) {
        return Err(VerificationResult::InvalidSignature);
    }

    Ok(payload)
}

/// Verifies a scanned certificate QR payload
///
/// This function:
/// 1. Parses the payload JSON and checks its HMAC signature
/// 2. Looks up the referenced credential
/// 3. Checks the revocation flag
/// 4. Returns the verification result
#[tracing::instrument(skip(pool, signing_key, raw_payload))]
pub async fn verify_scanned_payload(
    pool: &PgPool,
    signing_key: &[u8],
    raw_payload: &str,
) -> Result<VerificationResult, VerificationError> {
    tracing::debug!(payload_len = raw_payload.len(), "Verifying scanned payload");

    let payload = match authenticate_payload(raw_payload, signing_key) {
        Ok(p) => p,
        Err(outcome) => {
            tracing::warn!(result = outcome.result_type(), "Payload failed authentication");
            return Ok(outcome);
        }
    };

    let credential_id = match Uuid::parse_str(&payload.credential_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed credential ID in payload");
            return Ok(VerificationResult::InvalidPayload {
                error: format!("Invalid credential ID: {}", e),
            });
        }
    };

    let credential = match VerifiableCredential::find_by_id(pool, credential_id).await? {
        Some(c) => c,
        None => {
            tracing::warn!(credential_id = %credential_id, "Credential not found");
            return Ok(VerificationResult::NotFound { credential_id });
        }
    };

    if credential.revoked {
        tracing::info!(credential_id = %credential.id, "Credential revoked");
        return Ok(VerificationResult::Revoked { credential });
    }

    tracing::info!(credential_id = %credential.id, "Credential verified successfully");

    Ok(VerificationResult::Valid {
        credential,
        certificate: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const KEY: &[u8] = b"test-signing-key";

    fn signed_payload_json() -> String {
        let mut payload = CertificatePayload::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Wheat".to_string(),
            "500kg".to_string(),
            "Haryana, India".to_string(),
            "Hamburg, Germany".to_string(),
            Uuid::new_v4(),
            "Priya Sharma".to_string(),
            Uuid::new_v4(),
            "AgriQCert QA".to_string(),
            "Good".to_string(),
            Utc::now(),
        );
        let sig = payload.sign(KEY).unwrap();
        payload.signature = Some(sig);
        serde_json::to_string(&payload).unwrap()
    }

    #[test]
    fn test_authenticates_signed_payload() {
        let json = signed_payload_json();
        let payload = authenticate_payload(&json, KEY).unwrap();
        assert_eq!(payload.quality_grade, "Good");
    }

    #[test]
    fn test_rejects_garbage_payload() {
        let result = authenticate_payload("not json at all", KEY);
        assert!(matches!(
            result,
            Err(VerificationResult::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_signature() {
        let json = signed_payload_json();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value.as_object_mut().unwrap().remove("signature");

        let result = authenticate_payload(&value.to_string(), KEY);
        assert!(matches!(result, Err(VerificationResult::InvalidSignature)));
    }

    #[test]
    fn test_rejects_tampered_field() {
        let json = signed_payload_json();
        let tampered = json.replace("Good", "Excellent");

        let result = authenticate_payload(&tampered, KEY);
        assert!(matches!(result, Err(VerificationResult::InvalidSignature)));
    }

    #[test]
    fn test_rejects_wrong_key() {
        let json = signed_payload_json();
        let result = authenticate_payload(&json, b"other-key");
        assert!(matches!(result, Err(VerificationResult::InvalidSignature)));
    }
}
