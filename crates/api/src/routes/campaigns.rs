use axum::routing::{get, post};
use axum::Router;

use crate::handlers::campaigns;
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(campaigns::list).post(campaigns::create))
        .route(
            "/campaigns/{id}",
            get(campaigns::get_by_id).put(campaigns::update),
        )
        .route("/campaigns/{id}/recipients", post(campaigns::add_recipient))
        .route(
            "/campaigns/{id}/recipients/import",
            post(campaigns::import_recipients),
        )
        .route("/campaigns/{id}/progress", get(campaigns::progress))
        .route("/campaigns/{id}/send", post(campaigns::send))
}
