//! Axum router construction for the observer.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the observer router.
///
/// - `GET /` -- greeting page
/// - `GET /ws/greeting` -- `WebSocket` slot update stream
/// - `GET /api/greeting` -- current slot snapshot
/// - `GET /api/health` -- liveness
///
/// Unknown paths get a JSON 404.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/greeting", get(ws::ws_greeting))
        .route("/api/greeting", get(handlers::get_greeting))
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
