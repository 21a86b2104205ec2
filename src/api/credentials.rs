use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::api::middleware::auth::AuthenticatedUser;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::credential::VerifiableCredential;
use crate::models::user::Role;
use crate::services::credential_verifier::{self, VerificationResult};
use crate::services::qr_generator::{self, CertificatePayload};

#[derive(Debug, Deserialize)]
pub struct QrParams {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub message: String,
    pub credential: VerifiableCredential,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub payload: String,
}

/// Renders a credential's certificate QR code, SVG by default or PNG with
/// `?format=png`
async fn credential_qr(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(credential_id): Path<Uuid>,
    Query(params): Query<QrParams>,
) -> Result<Response> {
    let credential = VerifiableCredential::find_by_id(&state.pool, credential_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;

    let payload: CertificatePayload = serde_json::from_value(credential.qr_payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored payload unreadable: {}", e)))?;

    match params.format.as_deref() {
        Some("png") => {
            let png = qr_generator::generate_qr_png(&payload, &credential.qr_signature)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("QR rendering failed: {}", e)))?;

            Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response())
        }
        None | Some("svg") => {
            let svg = qr_generator::generate_qr_svg(&payload, &credential.qr_signature)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("QR rendering failed: {}", e)))?;

            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "image/svg+xml")],
                svg,
            )
                .into_response())
        }
        Some(other) => Err(AppError::Validation(format!(
            "Unsupported QR format: {}",
            other
        ))),
    }
}

/// Revokes a credential, removing its batch from importer listings
async fn revoke_credential(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(credential_id): Path<Uuid>,
    Json(body): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>> {
    caller.require_role(Role::QaAgency)?;

    let credential = VerifiableCredential::find_by_id(&state.pool, credential_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;

    if credential.revoked {
        return Err(AppError::Conflict(
            "Credential already revoked".to_string(),
        ));
    }

    VerifiableCredential::revoke(&state.pool, credential.id, body.reason.clone()).await?;

    let credential = VerifiableCredential::find_by_id(&state.pool, credential.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;

    tracing::info!(
        credential_id = %credential.id,
        revoked_by = %caller.user_id,
        reason = body.reason.as_deref().unwrap_or("unspecified"),
        "Credential revoked"
    );

    Ok(Json(RevokeResponse {
        message: "Credential revoked".to_string(),
        credential,
    }))
}

/// Verifies a scanned certificate QR payload
///
/// Public: a buyer scanning a printed code has no account context. Every
/// outcome is reported in the body rather than as an HTTP error.
async fn verify_payload(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>> {
    let result = credential_verifier::verify_scanned_payload(
        &state.pool,
        state.config.credential_signing_key.expose_secret().as_bytes(),
        &body.payload,
    )
    .await
    .map_err(|e| match e {
        credential_verifier::VerificationError::DatabaseError(e) => AppError::Database(e),
    })?;

    tracing::info!(result = result.result_type(), "Scan verification completed");

    let response = match result {
        VerificationResult::Valid {
            credential,
            certificate,
        } => json!({
            "result": "valid",
            "credential_id": credential.id,
            "batch_id": credential.batch_id,
            "quality_grade": credential.quality_grade,
            "issued_at": credential.issued_at,
            "certificate": certificate,
        }),
        VerificationResult::Revoked { credential } => json!({
            "result": "revoked",
            "credential_id": credential.id,
            "revoked_at": credential.revoked_at,
            "reason": credential.revocation_reason,
        }),
        VerificationResult::NotFound { credential_id } => json!({
            "result": "not_found",
            "credential_id": credential_id,
        }),
        VerificationResult::InvalidSignature => json!({
            "result": "invalid_signature",
        }),
        VerificationResult::InvalidPayload { error } => json!({
            "result": "invalid_payload",
            "error": error,
        }),
    };

    Ok(Json(response))
}

/// Creates the credentials router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/credentials/:id/qr", get(credential_qr))
        .route("/api/credentials/:id/revoke", post(revoke_credential))
        .route("/api/verify", post(verify_payload))
}
