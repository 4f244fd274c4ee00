//! Provider-facing webhook endpoints.
//!
//! The GET handshake echoes the challenge when the verify token
//! matches. The POST handler acknowledges with 200 before any work
//! happens -- the provider retries non-200 responses aggressively, and
//! a malformed payload is its problem, not a reason to be retried at.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use sherehe_whatsapp::webhook::WebhookEnvelope;

use crate::engine::inbound;
use crate::state::AppState;

/// Query parameters of the verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook -- subscription verification handshake.
///
/// 200 with the raw challenge as the body on a token match; 403 with
/// an empty body otherwise.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let mode_ok = params.mode.as_deref() == Some("subscribe");
    let token_ok =
        params.verify_token.as_deref() == Some(state.config.webhook_verify_token.as_str());

    if mode_ok && token_ok {
        tracing::info!("Webhook verification handshake accepted");
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!("Webhook verification handshake rejected");
        (StatusCode::FORBIDDEN, String::new()).into_response()
    }
}

/// POST /webhook -- event delivery.
///
/// Always 200. Processing runs as a detached task; its errors are
/// logged inside the engine.
pub async fn receive(State(state): State<AppState>, body: String) -> StatusCode {
    match serde_json::from_str::<WebhookEnvelope>(&body) {
        Ok(envelope) => {
            tokio::spawn(inbound::process_envelope(state, envelope));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unparseable webhook payload");
        }
    }
    StatusCode::OK
}
