use axum::{
    routing::{get, post},
    Router,
};
use crate::{
    handlers::*,
    openapi::{create_redoc, create_swagger_ui},
    AppState,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(index))
        .route("/status", get(status_page))

        // Email API
        .route("/send-email", post(send_email))
        .route("/api/status", get(email_status))

        // Health and metrics
        .route("/health", get(health))
        .route("/metrics", get(metrics))

        // API docs
        .merge(create_swagger_ui())
        .merge(create_redoc())
}

pub fn build_router(state: AppState) -> Router {
    create_router().with_state(state)
}
