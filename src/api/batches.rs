use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::auth::AuthenticatedUser;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::batch::{BatchStatus, CreateBatchData, ProductBatch};
use crate::models::credential::VerifiableCredential;
use crate::models::user::{Role, User};
use crate::services::credential_issuer::{self, CredentialIssuanceError, IssueCredentialRequest};

#[derive(Debug, Deserialize)]
pub struct SubmitBatchRequest {
    pub product_type: String,
    pub quantity: String,
    pub origin_location: String,
    pub destination: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitBatchResponse {
    pub message: String,
    pub batch: ProductBatch,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Verified,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBatchRequest {
    pub decision: ReviewDecision,
    pub quality_grade: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewBatchResponse {
    pub message: String,
    pub batch: ProductBatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<VerifiableCredential>,
}

/// Submits a new product batch owned by the caller
async fn submit_batch(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(body): Json<SubmitBatchRequest>,
) -> Result<(StatusCode, Json<SubmitBatchResponse>)> {
    let fields = [
        &body.product_type,
        &body.quantity,
        &body.origin_location,
        &body.destination,
    ];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::Validation(
            "product_type, quantity, origin_location and destination are required".to_string(),
        ));
    }

    let batch = ProductBatch::create(
        &state.pool,
        CreateBatchData {
            exporter_id: caller.user_id,
            product_type: body.product_type,
            quantity: body.quantity,
            origin_location: body.origin_location,
            destination: body.destination,
        },
    )
    .await?;

    tracing::info!(batch_id = %batch.id, exporter_id = %caller.user_id, "Batch submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitBatchResponse {
            message: "Product batch submitted".to_string(),
            batch,
        }),
    ))
}

/// Records a QA review decision for a batch
///
/// A `verified` decision also issues the batch's certificate credential.
/// Each batch is reviewable exactly once.
async fn review_batch(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<ReviewBatchRequest>,
) -> Result<Json<ReviewBatchResponse>> {
    caller.require_role(Role::QaAgency)?;

    let batch = ProductBatch::find_by_id(&state.pool, batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

    if batch.status != BatchStatus::Submitted.as_str() {
        return Err(AppError::Conflict(format!(
            "Batch already reviewed (status: {})",
            batch.status
        )));
    }

    match body.decision {
        ReviewDecision::Verified => {
            let quality_grade = body
                .quality_grade
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .ok_or_else(|| {
                    AppError::Validation(
                        "quality_grade is required when verifying a batch".to_string(),
                    )
                })?
                .to_string();

            let reviewer = User::find_by_id(&state.pool, caller.user_id)
                .await?
                .ok_or(AppError::Unauthorized)?;

            // Issue first so a failed issuance leaves the batch reviewable.
            let credential = credential_issuer::issue_credential(
                &state.pool,
                state.config.credential_signing_key.expose_secret().as_bytes(),
                IssueCredentialRequest {
                    batch_id: batch.id,
                    issuer_id: reviewer.id,
                    issuer_name: reviewer.full_name,
                    quality_grade,
                },
            )
            .await
            .map_err(issuance_error)?;

            ProductBatch::mark_reviewed(&state.pool, batch.id, BatchStatus::Verified, caller.user_id)
                .await?;

            let batch = ProductBatch::find_by_id(&state.pool, batch.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

            tracing::info!(
                batch_id = %batch.id,
                credential_id = %credential.id,
                reviewer_id = %caller.user_id,
                "Batch verified and credential issued"
            );

            Ok(Json(ReviewBatchResponse {
                message: "Batch verified".to_string(),
                batch,
                credential: Some(credential),
            }))
        }
        ReviewDecision::Rejected => {
            ProductBatch::mark_reviewed(&state.pool, batch.id, BatchStatus::Rejected, caller.user_id)
                .await?;

            let batch = ProductBatch::find_by_id(&state.pool, batch.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

            tracing::info!(batch_id = %batch.id, reviewer_id = %caller.user_id, "Batch rejected");

            Ok(Json(ReviewBatchResponse {
                message: "Batch rejected".to_string(),
                batch,
                credential: None,
            }))
        }
    }
}

fn issuance_error(e: CredentialIssuanceError) -> AppError {
    match e {
        CredentialIssuanceError::BatchNotFound => {
            AppError::NotFound("Batch not found".to_string())
        }
        CredentialIssuanceError::DuplicateCredential => {
            AppError::Conflict("Batch already carries an active credential".to_string())
        }
        CredentialIssuanceError::ExporterNotFound => {
            AppError::Internal(anyhow::anyhow!("Exporter missing for batch"))
        }
        CredentialIssuanceError::DatabaseError(e) => AppError::Database(e),
        CredentialIssuanceError::QrGeneration(e) => {
            AppError::Internal(anyhow::anyhow!("QR generation failed: {}", e))
        }
    }
}

/// Creates the batches router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/batches", post(submit_batch))
        .route("/api/batches/:id/review", post(review_batch))
}
