//! RSVP resolution: button keywords and encrypted Flow exchanges both
//! end up here.
//!
//! Every resolved decision stamps the invitation, replies to the guest
//! in the language they used, and publishes `rsvp.updated`. A guest
//! repeating a decision they already made gets an acknowledgement
//! without the invitation being re-stamped.

use serde_json::json;
use sherehe_core::rsvp::{already_recorded_text, confirmation_text, Language, RsvpChoice};
use sherehe_core::types::DbId;
use sherehe_db::models::invitation::Invitation;
use sherehe_db::models::status::RsvpStatus;
use sherehe_db::repositories::{ConversationRepo, InvitationRepo, MessageRepo};
use sherehe_db::repositories::invitation_repo::SetRsvpOutcome;
use sherehe_events::PlatformEvent;
use sherehe_whatsapp::client::WhatsAppError;
use sherehe_whatsapp::flow::FlowRequest;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Split a Flow token of the form `eventId_invitationId`.
pub fn parse_flow_token(token: &str) -> Option<(DbId, DbId)> {
    let (event_id, invitation_id) = token.split_once('_')?;
    Some((event_id.parse().ok()?, invitation_id.parse().ok()?))
}

/// Resolve a keyword decision arriving from a button tap or free text.
///
/// Buttons carry only the sender's phone, so the newest invitation
/// addressed to that phone is the one being answered. A phone with no
/// invitation is quietly ignored.
pub async fn handle_keyword(
    state: &AppState,
    phone: &str,
    choice: RsvpChoice,
    language: Language,
) -> AppResult<()> {
    let Some(invitation) = InvitationRepo::find_latest_by_phone(&state.pool, phone).await? else {
        tracing::debug!(phone, "RSVP keyword from a phone with no invitation");
        return Ok(());
    };

    resolve(state, &invitation, choice, language, None).await
}

/// Apply a decision to a specific invitation and confirm to the guest.
pub async fn resolve(
    state: &AppState,
    invitation: &Invitation,
    choice: RsvpChoice,
    language: Language,
    notes: Option<&str>,
) -> AppResult<()> {
    let status = match choice {
        RsvpChoice::Accept => RsvpStatus::Accepted,
        RsvpChoice::Decline => RsvpStatus::Declined,
    };

    let outcome = InvitationRepo::set_rsvp(&state.pool, invitation.id, status, notes)
        .await?
        .ok_or(AppError::Core(sherehe_core::error::CoreError::NotFound {
            entity: "Invitation",
            id: invitation.id,
        }))?;

    let reply = match &outcome {
        SetRsvpOutcome::Updated(updated) => {
            state.event_bus.publish(
                PlatformEvent::new("rsvp.updated")
                    .with_source("invitation", updated.id)
                    .with_payload(json!({
                        "invitation_id": updated.id,
                        "event_id": updated.event_id,
                        "status": match choice {
                            RsvpChoice::Accept => "accepted",
                            RsvpChoice::Decline => "declined",
                        },
                    })),
            );
            confirmation_text(choice, language, &invitation.guest_name)
        }
        SetRsvpOutcome::Unchanged(_) => {
            tracing::debug!(
                invitation_id = invitation.id,
                "Duplicate RSVP decision acknowledged"
            );
            already_recorded_text(choice, language, &invitation.guest_name)
        }
    };

    send_and_store_text(state, &invitation.phone, &reply).await;
    Ok(())
}

/// Send a free-form text to a guest and record it in the conversation.
///
/// Best-effort: a closed session window or provider outage must never
/// fail the resolution that triggered the reply.
pub async fn send_and_store_text(state: &AppState, phone: &str, body: &str) {
    match state.whatsapp.send_text(phone, body).await {
        Ok(receipt) => {
            let stored: Result<(), sqlx::Error> = async {
                let conversation = ConversationRepo::upsert(&state.pool, phone, None).await?;
                MessageRepo::insert_outbound(
                    &state.pool,
                    conversation.id,
                    &receipt.message_id,
                    "text",
                    body,
                )
                .await?;
                Ok(())
            }
            .await;
            if let Err(e) = stored {
                tracing::error!(phone, error = %e, "Failed to store outbound reply");
            }
        }
        Err(WhatsAppError::WindowExpired) => {
            tracing::warn!(phone, "Reply suppressed: session window expired");
            if let Err(e) = ConversationRepo::set_requires_template(&state.pool, phone, true).await
            {
                tracing::error!(phone, error = %e, "Failed to flag conversation for template");
            }
        }
        Err(e) => {
            tracing::error!(phone, error = %e, "Failed to send reply");
        }
    }
}

// ---------------------------------------------------------------------------
// Flow exchanges
// ---------------------------------------------------------------------------

/// Produce the plaintext response for one decrypted Flow request.
///
/// `ping` is a health echo; `INIT` and `BACK` re-render the RSVP screen
/// pre-filled from stored data; `data_exchange` applies the decision.
pub async fn handle_flow_request(
    state: &AppState,
    request: &FlowRequest,
) -> AppResult<serde_json::Value> {
    let version = request.version.as_deref().unwrap_or("3.0");

    match request.action.as_str() {
        "ping" => Ok(json!({
            "version": version,
            "data": { "status": "active" },
        })),
        "INIT" | "BACK" => {
            let invitation = invitation_for(state, request).await?;
            Ok(json!({
                "version": version,
                "screen": "RSVP",
                "data": {
                    "guest_name": invitation.guest_name,
                    "attendance": attendance_label(invitation.rsvp_status_id),
                    "notes": invitation.rsvp_notes.clone().unwrap_or_default(),
                },
            }))
        }
        "data_exchange" => {
            let invitation = invitation_for(state, request).await?;
            let data = request.data.as_ref().cloned().unwrap_or_default();

            let choice = match data["attendance_response"].as_str() {
                Some("accept") => RsvpChoice::Accept,
                Some("decline") => RsvpChoice::Decline,
                other => {
                    return Err(AppError::BadRequest(format!(
                        "Unknown attendance_response: {other:?}"
                    )))
                }
            };
            let language = match data["language"].as_str() {
                Some("sw") => Language::Swahili,
                _ => Language::English,
            };
            let notes = data["notes"].as_str().filter(|notes| !notes.is_empty());

            resolve(state, &invitation, choice, language, notes).await?;

            Ok(json!({
                "version": version,
                "screen": "SUCCESS",
                "data": {
                    "extension_message_response": {
                        "params": { "flow_token": request.flow_token },
                    },
                },
            }))
        }
        other => Err(AppError::BadRequest(format!("Unknown flow action: {other}"))),
    }
}

async fn invitation_for(state: &AppState, request: &FlowRequest) -> AppResult<Invitation> {
    let token = request
        .flow_token
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing flow_token".to_string()))?;
    let (_event_id, invitation_id) = parse_flow_token(token)
        .ok_or_else(|| AppError::BadRequest(format!("Malformed flow_token: {token}")))?;

    InvitationRepo::find_by_id(&state.pool, invitation_id)
        .await?
        .ok_or(AppError::Core(sherehe_core::error::CoreError::NotFound {
            entity: "Invitation",
            id: invitation_id,
        }))
}

fn attendance_label(status_id: i16) -> &'static str {
    match status_id {
        id if id == RsvpStatus::Accepted.id() => "accept",
        id if id == RsvpStatus::Declined.id() => "decline",
        _ => "pending",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_token_parses_event_and_invitation() {
        assert_eq!(parse_flow_token("42_7"), Some((42, 7)));
        assert_eq!(parse_flow_token("42"), None);
        assert_eq!(parse_flow_token("a_b"), None);
        assert_eq!(parse_flow_token(""), None);
    }

    #[test]
    fn attendance_labels_follow_rsvp_status() {
        assert_eq!(attendance_label(RsvpStatus::Pending.id()), "pending");
        assert_eq!(attendance_label(RsvpStatus::Accepted.id()), "accept");
        assert_eq!(attendance_label(RsvpStatus::Declined.id()), "decline");
    }
}
