use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerifiableCredential {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub issued_by: Uuid,
    pub quality_grade: String,
    pub qr_payload: JsonValue,
    pub qr_signature: String, // HMAC-SHA256 hex string
    pub qr_code_url: String,
    pub revoked: bool,
    pub revocation_reason: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateCredentialData {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub issued_by: Uuid,
    pub quality_grade: String,
    pub qr_payload: JsonValue,
    pub qr_signature: String,
    pub qr_code_url: String,
}

impl VerifiableCredential {
    /// Stores a freshly issued credential. The ID is generated by the caller
    /// because the signed payload embeds it.
    pub async fn create(pool: &PgPool, data: CreateCredentialData) -> Result<Self, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO verifiable_credentials (
                id, batch_id, issued_by, quality_grade,
                qr_payload, qr_signature, qr_code_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.id)
        .bind(data.batch_id)
        .bind(data.issued_by)
        .bind(&data.quality_grade)
        .bind(&data.qr_payload)
        .bind(&data.qr_signature)
        .bind(&data.qr_code_url)
        .fetch_one(pool)
        .await?;

        Ok(credential)
    }

    /// Finds a credential by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM verifiable_credentials WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(credential)
    }

    /// Finds the active (non-revoked) credential for a batch, if any
    pub async fn find_active_by_batch(
        pool: &PgPool,
        batch_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let credential = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM verifiable_credentials
            WHERE batch_id = $1 AND revoked = FALSE
            ORDER BY issued_at DESC
            LIMIT 1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(pool)
        .await?;

        Ok(credential)
    }

    /// Marks a credential as revoked
    pub async fn revoke(
        pool: &PgPool,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE verifiable_credentials
            SET revoked = TRUE, revocation_reason = $2, revoked_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;

        Ok(())
    }
}
