use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::AppError;
use crate::models::user::Role;
use crate::services::token;

/// Authenticated caller identity extracted from the bearer token.
///
/// The role is kept as the raw claim string; endpoints that branch on it
/// parse into [`Role`] and answer Forbidden for anything unrecognized.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthenticatedUser {
    /// Parses the role claim, or answers Forbidden
    pub fn role(&self) -> Result<Role, AppError> {
        self.role
            .parse::<Role>()
            .map_err(|_| AppError::Forbidden("Unauthorized role".to_string()))
    }

    /// Requires the caller to hold a specific role
    pub fn require_role(&self, required: Role) -> Result<(), AppError> {
        if self.role()? == required {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Requires {} role",
                required.as_str()
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let data = token::decode_token(token, state.config.jwt_secret.expose_secret())
            .map_err(|e| {
                tracing::debug!(error = %e, "Token validation failed");
                AppError::Unauthorized
            })?;

        let user_id =
            Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized)?;

        Ok(AuthenticatedUser {
            user_id,
            role: data.claims.role,
        })
    }
}
