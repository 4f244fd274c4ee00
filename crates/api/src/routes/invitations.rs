use axum::routing::get;
use axum::Router;

use crate::handlers::invitations;
use crate::state::AppState;

/// Invitation routes: creation is nested under the owning event.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/invitations",
            get(invitations::list_by_event).post(invitations::create),
        )
        .route("/invitations/{id}", get(invitations::get_by_id))
}
