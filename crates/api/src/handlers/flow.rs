//! Encrypted Flow endpoint.
//!
//! Order matters: the signature over the raw body is checked before
//! anything is parsed (432 on mismatch), then the envelope is
//! decrypted (421 on failure). The response is re-encrypted under the
//! request's session key with the inverted IV and sent as plain text.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use sherehe_whatsapp::flow::{FlowCodecError, FlowEnvelope};

use crate::engine::rsvp;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// POST /flow -- one encrypted Flow exchange.
pub async fn exchange(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Flow(FlowCodecError::SignatureInvalid))?;
    state.flow_codec.verify(signature, &body)?;

    let envelope: FlowEnvelope = serde_json::from_slice(&body)
        .map_err(|_| AppError::Flow(FlowCodecError::Envelope("body is not a flow envelope")))?;
    let (request, session) = state.flow_codec.decrypt(&envelope)?;

    tracing::debug!(action = %request.action, screen = ?request.screen, "Flow request");
    let payload = rsvp::handle_flow_request(&state, &request).await?;

    let encrypted = state.flow_codec.encrypt_response(&session, &payload)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain")],
        encrypted,
    )
        .into_response())
}
