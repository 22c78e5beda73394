pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::plan::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/plans/generate", post(handlers::handle_generate))
        .route(
            "/api/v1/plans/:filename/download",
            get(handlers::handle_download),
        )
        .with_state(state)
}
