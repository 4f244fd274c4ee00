use axum::routing::get;
use axum::Router;

use crate::handlers::conversations;
use crate::state::AppState;

/// Routes mounted at `/conversations`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(conversations::list))
        .route("/conversations/{id}/messages", get(conversations::messages))
}
