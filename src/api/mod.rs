// API module - HTTP endpoints

use axum::extract::FromRef;
use sqlx::PgPool;

pub mod auth;
pub mod batches;
pub mod credentials;
pub mod health;
pub mod middleware;
pub mod products;
pub mod users;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: crate::config::Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}
