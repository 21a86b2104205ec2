use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical role enumeration shared by signup validation, token claims and
/// listing authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Exporter,
    QaAgency,
    Importer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Exporter => "exporter",
            Role::QaAgency => "qa_agency",
            Role::Importer => "importer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exporter" => Ok(Role::Exporter),
            "qa_agency" => Ok(Role::QaAgency),
            "importer" => Ok(Role::Importer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Non-sensitive projection returned by the profile endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl User {
    /// Creates a new user record
    pub async fn create(pool: &PgPool, data: CreateUserData) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (username, password_hash, email, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&data.email)
        .bind(&data.full_name)
        .bind(data.role.as_str())
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by their internal ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by their unique username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Fetches the non-sensitive fields for the profile endpoint
    pub async fn find_profile(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, email, full_name, role, created_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Exporter, Role::QaAgency, Role::Importer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("farmer".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::QaAgency).unwrap();
        assert_eq!(json, r#""qa_agency""#);
        let parsed: Role = serde_json::from_str(r#""importer""#).unwrap();
        assert_eq!(parsed, Role::Importer);
    }
}
