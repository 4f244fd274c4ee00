pub mod campaigns;
pub mod cards;
pub mod conversations;
pub mod health;
pub mod invitations;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /campaigns                          list, create
/// /campaigns/{id}                     get, update (resets to draft)
/// /campaigns/{id}/recipients          add one recipient
/// /campaigns/{id}/recipients/import   CSV upload (multipart)
/// /campaigns/{id}/progress            counters + per-recipient status
/// /campaigns/{id}/send                start the send loop (202)
///
/// /conversations                      list
/// /conversations/{id}/messages        message history
///
/// /events/{event_id}/invitations      list, create
/// /invitations/{id}                   get
///
/// /cards/batches                      enqueue batch
/// /cards/batches/{id}                 batch status
/// /cards/jobs/claim                   worker claim (POST)
/// /cards/jobs/{id}/result             worker result callback (POST)
/// ```
///
/// The provider-facing `/webhook` and `/flow` endpoints live at root
/// level, next to `/health`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(campaigns::router())
        .merge(conversations::router())
        .merge(invitations::router())
        .merge(cards::router())
}
