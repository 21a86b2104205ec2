use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::auth::AuthenticatedUser;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::user::{User, UserProfile};

/// Returns the authenticated caller's own profile
async fn me(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<UserProfile>> {
    let profile = User::find_profile(&state.pool, caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// Creates the users router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/me", get(me))
}
