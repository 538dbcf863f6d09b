// src/state.rs

use crate::config::Config;
use axum::extract::FromRef;
use sqlx::PgPool;

/// Shared state for the learning platform: the Postgres pool every service
/// runs its queries on, plus the runtime configuration (JWT signing secret,
/// token lifetime, admin seed credentials).
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

/// Lets handlers take `State<PgPool>` directly instead of the full state.
impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Needed by the auth middleware and the login handler, which only care
/// about the JWT settings.
impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
