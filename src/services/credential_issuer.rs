use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    batch::ProductBatch,
    credential::{CreateCredentialData, VerifiableCredential},
    user::User,
};
use crate::services::qr_generator;

#[derive(thiserror::Error, Debug)]
pub enum CredentialIssuanceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("QR generation failed: {0}")]
    QrGeneration(#[from] qr_generator::QrGenerationError),

    #[error("Batch not found")]
    BatchNotFound,

    #[error("Exporter not found for batch")]
    ExporterNotFound,

    #[error("Batch already carries an active credential")]
    DuplicateCredential,
}

/// Request to issue a certificate credential for a reviewed batch
pub struct IssueCredentialRequest {
    pub batch_id: Uuid,
    pub issuer_id: Uuid,
    pub issuer_name: String,
    pub quality_grade: String,
}

/// Issues a verifiable credential for a batch
///
/// This function orchestrates the issuance flow:
/// 1. Loads the batch and its owning exporter
/// 2. Rejects batches that already carry an active credential
/// 3. Builds and signs the certificate QR payload
/// 4. Stores the credential row with the signed payload
#[tracing::instrument(skip(pool, signing_key, request), fields(batch_id = %request.batch_id))]
pub async fn issue_credential(
    pool: &PgPool,
    signing_key: &[u8],
    request: IssueCredentialRequest,
) -> Result<VerifiableCredential, CredentialIssuanceError> {
    tracing::info!("Starting credential issuance");

    let batch = ProductBatch::find_by_id(pool, request.batch_id)
        .await?
        .ok_or(CredentialIssuanceError::BatchNotFound)?;

    if VerifiableCredential::find_active_by_batch(pool, batch.id)
        .await?
        .is_some()
    {
        return Err(CredentialIssuanceError::DuplicateCredential);
    }

    let exporter = User::find_by_id(pool, batch.exporter_id)
        .await?
        .ok_or(CredentialIssuanceError::ExporterNotFound)?;

    // The payload embeds the credential ID, so it is generated here rather
    // than by the database.
    let credential_id = Uuid::new_v4();
    let issued_at = Utc::now();

    let mut payload = qr_generator::CertificatePayload::new(
        credential_id,
        batch.id,
        batch.product_type.clone(),
        batch.quantity.clone(),
        batch.origin_location.clone(),
        batch.destination.clone(),
        exporter.id,
        exporter.full_name.clone(),
        request.issuer_id,
        request.issuer_name.clone(),
        request.quality_grade.clone(),
        issued_at,
    );

    let qr_signature = payload.sign(signing_key)?;
    payload.signature = Some(qr_signature.clone());

    tracing::debug!(credential_id = %credential_id, "Certificate payload signed");

    let credential = VerifiableCredential::create(
        pool,
        CreateCredentialData {
            id: credential_id,
            batch_id: batch.id,
            issued_by: request.issuer_id,
            quality_grade: request.quality_grade,
            qr_payload: payload.to_jsonb(),
            qr_signature,
            qr_code_url: format!("/api/credentials/{}/qr", credential_id),
        },
    )
    .await?;

    tracing::info!(
        credential_id = %credential.id,
        batch_id = %credential.batch_id,
        "Credential issued successfully"
    );

    Ok(credential)
}
