//! Message event router.
//!
//! One webhook change value can carry contacts, inbound messages, and
//! delivery statuses in any combination; messages and statuses are
//! processed independently. Webhook processing runs detached from the
//! HTTP response, so every failure here is logged and swallowed -- the
//! provider already got its 200.

use serde_json::json;
use sherehe_core::phone::normalize_phone;
use sherehe_core::rsvp::{parse_reply, Language, RsvpChoice};
use sherehe_db::models::status::MessageStatus;
use sherehe_db::repositories::message_repo::StatusUpdateOutcome;
use sherehe_db::repositories::{CampaignRepo, ConversationRepo, MessageRepo, RecipientRepo};
use sherehe_events::PlatformEvent;
use sherehe_whatsapp::webhook::{
    ChangeValue, InboundBody, InboundMessage, NfmReply, StatusUpdate, WebhookEnvelope,
};

use crate::engine::rsvp;
use crate::error::AppResult;
use crate::state::AppState;

/// Placeholder stored for message types the pipeline does not handle.
const UNSUPPORTED_PLACEHOLDER: &str = "[unsupported message]";

/// Process a full webhook envelope. Entry point for the detached task
/// spawned by the webhook POST handler.
pub async fn process_envelope(state: AppState, envelope: WebhookEnvelope) {
    for entry in &envelope.entry {
        for change in &entry.changes {
            if change.field != "messages" {
                tracing::debug!(field = %change.field, "Skipping non-message webhook change");
                continue;
            }
            process_change_value(&state, &change.value).await;
        }
    }
}

/// Route one change value: messages first, then statuses. Either list
/// may be absent.
pub async fn process_change_value(state: &AppState, value: &ChangeValue) {
    let names = value.contact_names();

    for message in value.messages.iter().flatten() {
        let name = names.get(&message.from).map(String::as_str);
        if let Err(e) = handle_message(state, message, name).await {
            tracing::error!(
                wa_message_id = %message.id,
                error = %e,
                "Failed to process inbound message"
            );
        }
    }

    for status in value.statuses.iter().flatten() {
        if let Err(e) = handle_status(state, status).await {
            tracing::error!(
                wa_message_id = %status.id,
                error = %e,
                "Failed to process status update"
            );
        }
    }
}

async fn handle_message(
    state: &AppState,
    message: &InboundMessage,
    contact_name: Option<&str>,
) -> AppResult<()> {
    let Some(phone) = normalize_phone(&message.from) else {
        tracing::warn!(from = %message.from, "Inbound message from unparseable phone");
        return Ok(());
    };

    let conversation = ConversationRepo::upsert(&state.pool, &phone, contact_name).await?;

    // An inbound message reopens the 24-hour session window.
    if conversation.requires_template {
        ConversationRepo::set_requires_template(&state.pool, &phone, false).await?;
    }

    let (content_type, content) = describe(&message.body);
    let stored = MessageRepo::insert_inbound(
        &state.pool,
        conversation.id,
        &message.id,
        content_type,
        &content,
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new("message.received")
            .with_source("conversation", conversation.id)
            .with_payload(json!({
                "message_id": stored.id,
                "phone": phone,
                "content_type": content_type,
            })),
    );

    match &message.body {
        InboundBody::Text { text } => {
            if let Some((choice, language)) = parse_reply(&text.body) {
                rsvp::handle_keyword(state, &phone, choice, language).await?;
            }
        }
        InboundBody::Button { button } => {
            let matched = button
                .payload
                .as_deref()
                .and_then(parse_reply)
                .or_else(|| button.text.as_deref().and_then(parse_reply));
            if let Some((choice, language)) = matched {
                rsvp::handle_keyword(state, &phone, choice, language).await?;
            } else {
                tracing::debug!(wa_message_id = %message.id, "Button reply matched no keyword");
            }
        }
        InboundBody::Interactive { interactive } => {
            if let Some(reply) = &interactive.nfm_reply {
                handle_nfm_reply(state, &phone, reply).await?;
            } else if let Some(button) = &interactive.button_reply {
                let matched = button
                    .id
                    .as_deref()
                    .and_then(parse_reply)
                    .or_else(|| button.title.as_deref().and_then(parse_reply));
                if let Some((choice, language)) = matched {
                    rsvp::handle_keyword(state, &phone, choice, language).await?;
                }
            }
        }
        InboundBody::Unsupported => {}
    }

    Ok(())
}

/// A completed Flow arriving through the inbound webhook (as opposed to
/// the encrypted endpoint): the response JSON carries the same fields
/// the data_exchange handler sees.
async fn handle_nfm_reply(state: &AppState, phone: &str, reply: &NfmReply) -> AppResult<()> {
    let data: serde_json::Value = match serde_json::from_str(&reply.response_json) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "Flow reply carried unparseable JSON");
            return Ok(());
        }
    };

    let choice = match data["attendance_response"].as_str() {
        Some("accept") => RsvpChoice::Accept,
        Some("decline") => RsvpChoice::Decline,
        _ => {
            tracing::debug!("Flow reply without an attendance decision");
            return Ok(());
        }
    };
    let language = match data["language"].as_str() {
        Some("sw") => Language::Swahili,
        _ => Language::English,
    };
    let notes = data["notes"].as_str().filter(|notes| !notes.is_empty());

    // Prefer the invitation named by the token; fall back to the
    // newest invitation for the sender.
    let invitation = match data["flow_token"].as_str().and_then(rsvp::parse_flow_token) {
        Some((_event_id, invitation_id)) => {
            sherehe_db::repositories::InvitationRepo::find_by_id(&state.pool, invitation_id).await?
        }
        None => {
            sherehe_db::repositories::InvitationRepo::find_latest_by_phone(&state.pool, phone)
                .await?
        }
    };

    let Some(invitation) = invitation else {
        tracing::debug!(phone, "Flow reply matched no invitation");
        return Ok(());
    };

    rsvp::resolve(state, &invitation, choice, language, notes).await
}

async fn handle_status(state: &AppState, status: &StatusUpdate) -> AppResult<()> {
    let Some(new_status) = MessageStatus::from_wire(&status.status) else {
        tracing::warn!(status = %status.status, "Unknown wire status");
        return Ok(());
    };

    let error_detail = status.error_detail();
    let outcome = MessageRepo::update_status(
        &state.pool,
        &status.id,
        new_status,
        status.parsed_timestamp(),
        error_detail.as_deref(),
    )
    .await?;

    let message = match outcome {
        StatusUpdateOutcome::Updated(message) => message,
        StatusUpdateOutcome::Ignored => {
            tracing::debug!(
                wa_message_id = %status.id,
                status = %status.status,
                "Out-of-order status update ignored"
            );
            return Ok(());
        }
        StatusUpdateOutcome::Unknown => {
            tracing::info!(
                wa_message_id = %status.id,
                "Status update for unknown message id"
            );
            return Ok(());
        }
    };

    state.event_bus.publish(
        PlatformEvent::new("message.status")
            .with_source("message", message.id)
            .with_payload(json!({
                "wa_message_id": status.id,
                "status": status.status,
            })),
    );

    match new_status {
        MessageStatus::Delivered => {
            // Feed delivery back into campaign accounting when the
            // message belongs to a campaign send.
            if let Some(campaign_id) =
                RecipientRepo::mark_delivered_by_message(&state.pool, message.id).await?
            {
                CampaignRepo::increment_delivered(&state.pool, campaign_id).await?;
                state.event_bus.publish(
                    PlatformEvent::new("campaign.progress")
                        .with_source("campaign", campaign_id)
                        .with_payload(json!({ "delivered_message_id": message.id })),
                );
            }
        }
        MessageStatus::Failed if status.is_window_expired() => {
            let phone = match status.recipient_id.as_deref().and_then(normalize_phone) {
                Some(phone) => Some(phone),
                None => ConversationRepo::phone_for(&state.pool, message.conversation_id).await?,
            };
            if let Some(phone) = phone {
                ConversationRepo::set_requires_template(&state.pool, &phone, true).await?;
                state.event_bus.publish(
                    PlatformEvent::new("conversation.window_expired")
                        .with_payload(json!({ "phone": phone })),
                );
            }
        }
        _ => {}
    }

    Ok(())
}

fn describe(body: &InboundBody) -> (&'static str, String) {
    match body {
        InboundBody::Text { text } => ("text", text.body.clone()),
        InboundBody::Button { button } => (
            "button",
            button
                .text
                .clone()
                .or_else(|| button.payload.clone())
                .unwrap_or_default(),
        ),
        InboundBody::Interactive { interactive } => {
            if let Some(reply) = &interactive.nfm_reply {
                ("flow_reply", reply.response_json.clone())
            } else if let Some(button) = &interactive.button_reply {
                (
                    "button",
                    button
                        .title
                        .clone()
                        .or_else(|| button.id.clone())
                        .unwrap_or_default(),
                )
            } else {
                ("interactive", String::new())
            }
        }
        InboundBody::Unsupported => ("unsupported", UNSUPPORTED_PLACEHOLDER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_extracts_text_body() {
        let body = InboundBody::Text {
            text: sherehe_whatsapp::webhook::TextBody {
                body: "ndiyo".into(),
            },
        };
        assert_eq!(describe(&body), ("text", "ndiyo".to_string()));
    }

    #[test]
    fn describe_prefers_button_text_over_payload() {
        let body = InboundBody::Button {
            button: sherehe_whatsapp::webhook::ButtonReply {
                text: Some("Yes".into()),
                payload: Some("rsvp_accept".into()),
            },
        };
        assert_eq!(describe(&body), ("button", "Yes".to_string()));
    }

    #[test]
    fn unsupported_message_is_stored_as_placeholder() {
        let (kind, content) = describe(&InboundBody::Unsupported);
        assert_eq!(kind, "unsupported");
        assert_eq!(content, UNSUPPORTED_PLACEHOLDER);
    }
}
