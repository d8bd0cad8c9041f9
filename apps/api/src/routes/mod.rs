pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/generate-avatar", post(handlers::handle_generate_avatar))
        .route(
            "/api/generate-portfolio",
            post(handlers::handle_generate_portfolio),
        )
        .with_state(state)
}
