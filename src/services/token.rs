//! JWT token service

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bearer tokens expire two hours after login.
pub const TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Role string as stored at signup
    pub role: String,
    pub exp: i64,
}

/// Encodes a signed bearer token carrying the user's id and role
pub fn issue_token(
    user_id: Uuid,
    role: &str,
    secret_key: &str,
    expire_seconds: i64,
) -> jsonwebtoken::errors::Result<String> {
    let exp = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(expire_seconds))
        .unwrap_or_else(chrono::Utc::now)
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp,
    };

    let encoding_key = EncodingKey::from_secret(secret_key.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
}

/// Decodes and validates a bearer token
pub fn decode_token(
    token: &str,
    secret_key: &str,
) -> jsonwebtoken::errors::Result<jsonwebtoken::TokenData<Claims>> {
    let decoding_key = DecodingKey::from_secret(secret_key.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "exporter", SECRET, TOKEN_TTL_SECONDS).unwrap();

        let data = decode_token(&token, SECRET).unwrap();
        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.role, "exporter");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(Uuid::new_v4(), "importer", SECRET, TOKEN_TTL_SECONDS).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default validation leeway
        let token = issue_token(Uuid::new_v4(), "qa_agency", SECRET, -3600).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = issue_token(Uuid::new_v4(), "exporter", SECRET, TOKEN_TTL_SECONDS).unwrap();
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);
        assert!(decode_token(&tampered, SECRET).is_err());
    }
}
