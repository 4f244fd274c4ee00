//! Provider-facing routes, mounted at root level (the provider cannot
//! be told about `/api/v1`).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{flow, webhook};
use crate::state::AppState;

/// ```text
/// GET  /webhook   verification handshake
/// POST /webhook   event delivery (always 200)
/// POST /flow      encrypted Flow exchange
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", get(webhook::verify).post(webhook::receive))
        .route("/flow", post(flow::exchange))
}
