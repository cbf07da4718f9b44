pub mod app;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use app::*;
pub use handlers::*;
pub use openapi::*;
pub use routes::*;
pub use state::*;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Router with state applied plus tracing, CORS and body-size middleware.
pub fn build_app(state: AppState) -> Router {
    let body_size_limit = (state.config.server.max_request_body_size_mb * 1024 * 1024) as usize;

    build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(body_size_limit)),
    )
}
