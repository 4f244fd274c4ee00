use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cards;
use crate::state::AppState;

/// Routes mounted at `/cards`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cards/batches", post(cards::enqueue))
        .route("/cards/batches/{id}", get(cards::batch_status))
        .route("/cards/jobs/claim", post(cards::claim_job))
        .route("/cards/jobs/{id}/result", post(cards::report_job))
}
