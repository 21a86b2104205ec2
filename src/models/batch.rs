use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Review lifecycle of a batch. Transitions exactly once, from `Submitted`
/// to either `Verified` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Submitted,
    Verified,
    Rejected,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Submitted => "submitted",
            BatchStatus::Verified => "verified",
            BatchStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(BatchStatus::Submitted),
            "verified" => Ok(BatchStatus::Verified),
            "rejected" => Ok(BatchStatus::Rejected),
            other => Err(format!("unknown batch status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductBatch {
    pub id: Uuid,
    pub exporter_id: Uuid,
    pub product_type: String,
    pub quantity: String,
    pub origin_location: String,
    pub destination: String,
    pub status: String,
    pub submission_date: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Batch row joined with the owning exporter's name, as returned to the
/// exporter and QA listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BatchWithExporter {
    pub id: Uuid,
    pub exporter_id: Uuid,
    pub product_type: String,
    pub quantity: String,
    pub origin_location: String,
    pub destination: String,
    pub status: String,
    pub submission_date: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub exporter_name: String,
}

/// Certified batch row for the importer listing: only batches carrying a
/// non-revoked credential, with the certificate facts attached.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CertifiedBatch {
    pub id: Uuid,
    pub exporter_id: Uuid,
    pub product_type: String,
    pub quantity: String,
    pub origin_location: String,
    pub destination: String,
    pub status: String,
    pub submission_date: DateTime<Utc>,
    pub exporter_name: String,
    pub credential_id: Uuid,
    pub quality_grade: String,
    pub qr_code_url: String,
}

#[derive(Debug, Clone)]
pub struct CreateBatchData {
    pub exporter_id: Uuid,
    pub product_type: String,
    pub quantity: String,
    pub origin_location: String,
    pub destination: String,
}

impl ProductBatch {
    /// Creates a new batch owned by the submitting exporter
    pub async fn create(pool: &PgPool, data: CreateBatchData) -> Result<Self, sqlx::Error> {
        let batch = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO product_batches (exporter_id, product_type, quantity, origin_location, destination)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.exporter_id)
        .bind(&data.product_type)
        .bind(&data.quantity)
        .bind(&data.origin_location)
        .bind(&data.destination)
        .fetch_one(pool)
        .await?;

        Ok(batch)
    }

    /// Finds a batch by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let batch = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM product_batches WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(batch)
    }

    /// Lists an exporter's own batches, newest first
    pub async fn list_for_exporter(
        pool: &PgPool,
        exporter_id: Uuid,
    ) -> Result<Vec<BatchWithExporter>, sqlx::Error> {
        let batches = sqlx::query_as::<_, BatchWithExporter>(
            r#"
            SELECT pb.*, u.full_name AS exporter_name
            FROM product_batches pb
            JOIN users u ON pb.exporter_id = u.id
            WHERE pb.exporter_id = $1
            ORDER BY pb.submission_date DESC
            "#,
        )
        .bind(exporter_id)
        .fetch_all(pool)
        .await?;

        Ok(batches)
    }

    /// Lists every batch for QA inspection, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<BatchWithExporter>, sqlx::Error> {
        let batches = sqlx::query_as::<_, BatchWithExporter>(
            r#"
            SELECT pb.*, u.full_name AS exporter_name
            FROM product_batches pb
            JOIN users u ON pb.exporter_id = u.id
            ORDER BY pb.submission_date DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(batches)
    }

    /// Lists batches carrying a non-revoked credential, newest first
    pub async fn list_certified(pool: &PgPool) -> Result<Vec<CertifiedBatch>, sqlx::Error> {
        let batches = sqlx::query_as::<_, CertifiedBatch>(
            r#"
            SELECT pb.id, pb.exporter_id, pb.product_type, pb.quantity,
                   pb.origin_location, pb.destination, pb.status, pb.submission_date,
                   u.full_name AS exporter_name,
                   vc.id AS credential_id, vc.quality_grade, vc.qr_code_url
            FROM product_batches pb
            JOIN users u ON pb.exporter_id = u.id
            JOIN verifiable_credentials vc ON vc.batch_id = pb.id
            WHERE vc.revoked = FALSE
            ORDER BY pb.submission_date DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(batches)
    }

    /// Records the review outcome for a batch
    pub async fn mark_reviewed(
        pool: &PgPool,
        id: Uuid,
        status: BatchStatus,
        reviewer_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE product_batches
            SET status = $2, reviewed_by = $3, reviewed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            BatchStatus::Submitted,
            BatchStatus::Verified,
            BatchStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<BatchStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("pending".parse::<BatchStatus>().is_err());
        assert!("certified".parse::<BatchStatus>().is_err());
    }
}
