use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api::middleware::auth::AuthenticatedUser;
use crate::api::AppState;
use crate::error::Result;
use crate::models::batch::ProductBatch;
use crate::models::user::Role;

/// Returns the role-filtered batch listing
///
/// - exporter: own batches, newest first
/// - qa_agency: every batch, for inspection
/// - importer: only batches carrying a non-revoked credential
async fn list_products(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Response> {
    match caller.role()? {
        Role::Exporter => {
            let batches = ProductBatch::list_for_exporter(&state.pool, caller.user_id).await?;
            Ok(Json(batches).into_response())
        }
        Role::QaAgency => {
            let batches = ProductBatch::list_all(&state.pool).await?;
            Ok(Json(batches).into_response())
        }
        Role::Importer => {
            let batches = ProductBatch::list_certified(&state.pool).await?;
            Ok(Json(batches).into_response())
        }
    }
}

/// Creates the products router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/products", get(list_products))
}
