use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::user::{CreateUserData, Role, User};
use crate::services::{password, token};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Registers a new user
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let role = body
        .role
        .parse::<Role>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if User::find_by_username(&state.pool, &body.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let password_hash = password::hash_password(&body.password)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;

    let user = User::create(
        &state.pool,
        CreateUserData {
            username: body.username,
            password_hash,
            email: body.email,
            full_name: body.full_name,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Authenticates a user and issues a bearer token
///
/// Unknown username and wrong password produce the same response, so the
/// endpoint cannot be used to enumerate accounts.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = User::find_by_username(&state.pool, &body.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let matches = password::verify_password(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check failed: {}", e)))?;

    if !matches {
        return Err(AppError::InvalidCredentials);
    }

    let token = token::issue_token(
        user.id,
        &user.role,
        state.config.jwt_secret.expose_secret(),
        token::TOKEN_TTL_SECONDS,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Token issuance failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

/// Creates the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
}
