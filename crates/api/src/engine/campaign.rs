//! Campaign send loop.
//!
//! Starting a campaign is synchronous up to the draft check and the
//! flip to `sending`; the actual send loop runs as a detached task so
//! the HTTP caller gets an immediate answer. The loop is sequential
//! with a fixed inter-message delay, which is the whole of the rate
//! limiter by design of the provider's per-number throughput rules.

use std::time::Duration;

use serde_json::json;
use sherehe_core::error::CoreError;
use sherehe_core::media::infer_media_kind;
use sherehe_core::types::DbId;
use sherehe_db::models::campaign::Campaign;
use sherehe_db::models::recipient::Recipient;
use sherehe_db::models::status::CampaignStatus;
use sherehe_db::repositories::{CampaignRepo, ConversationRepo, MessageRepo, RecipientRepo};
use sherehe_events::PlatformEvent;
use sherehe_whatsapp::template::{render_preview, Component};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Validate, flip to `sending`, and spawn the detached send loop.
///
/// Only draft campaigns can be sent; a campaign with no pending
/// recipients is rejected without any state change.
pub async fn start(state: &AppState, campaign_id: DbId) -> AppResult<Campaign> {
    let campaign = CampaignRepo::find_by_id(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    if campaign.status_id != CampaignStatus::Draft.id() {
        return Err(AppError::Core(CoreError::State(
            "Only draft campaigns can be sent".to_string(),
        )));
    }

    let recipients = RecipientRepo::snapshot_pending(&state.pool, campaign_id).await?;
    if recipients.is_empty() {
        return Err(AppError::Core(CoreError::State(
            "Campaign has no pending recipients".to_string(),
        )));
    }

    let began =
        CampaignRepo::begin_sending(&state.pool, campaign_id, recipients.len() as i32).await?;
    if !began {
        // Lost a race with another send request.
        return Err(AppError::Core(CoreError::State(
            "Campaign is no longer in draft".to_string(),
        )));
    }

    tracing::info!(
        campaign_id,
        recipients = recipients.len(),
        "Campaign send started"
    );

    let task_state = state.clone();
    let task_campaign = campaign.clone();
    tokio::spawn(async move {
        run_send_loop(task_state, task_campaign, recipients).await;
    });

    CampaignRepo::find_by_id(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))
}

/// The detached sequential send loop. Per-recipient failures are
/// recorded and the loop continues; only the terminal status depends
/// on the aggregate outcome.
async fn run_send_loop(state: AppState, campaign: Campaign, recipients: Vec<Recipient>) {
    let delay = Duration::from_millis(state.config.campaign_send_delay_ms);
    let mut sent = 0u32;
    let mut failed = 0u32;

    for (index, recipient) in recipients.iter().enumerate() {
        match send_to_recipient(&state, &campaign, recipient).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    campaign_id = campaign.id,
                    recipient_id = recipient.id,
                    error = %e,
                    "Campaign recipient failed"
                );
            }
        }

        state.event_bus.publish(
            PlatformEvent::new("campaign.progress")
                .with_source("campaign", campaign.id)
                .with_payload(json!({
                    "sent": sent,
                    "failed": failed,
                    "total": recipients.len(),
                })),
        );

        // Pace between sends only; the last recipient should not delay
        // the terminal status flip.
        if index + 1 < recipients.len() {
            tokio::time::sleep(delay).await;
        }
    }

    // Completed when anything went out; failed only when nothing did.
    let terminal = if sent > 0 {
        CampaignStatus::Completed
    } else {
        CampaignStatus::Failed
    };
    if let Err(e) = CampaignRepo::finish(&state.pool, campaign.id, terminal).await {
        tracing::error!(campaign_id = campaign.id, error = %e, "Failed to finalize campaign");
    }

    tracing::info!(
        campaign_id = campaign.id,
        sent,
        failed,
        status = ?terminal,
        "Campaign send finished"
    );

    state.event_bus.publish(
        PlatformEvent::new("campaign.completed")
            .with_source("campaign", campaign.id)
            .with_payload(json!({
                "sent": sent,
                "failed": failed,
                "status": match terminal {
                    CampaignStatus::Failed => "failed",
                    _ => "completed",
                },
            })),
    );
}

async fn send_to_recipient(
    state: &AppState,
    campaign: &Campaign,
    recipient: &Recipient,
) -> AppResult<()> {
    let components = build_components(campaign, recipient);

    let result = state
        .whatsapp
        .send_template(
            &recipient.phone,
            &campaign.template_name,
            &campaign.template_language,
            &components,
        )
        .await;

    match result {
        Ok(receipt) => {
            let conversation = ConversationRepo::upsert(
                &state.pool,
                &recipient.phone,
                recipient.name.as_deref(),
            )
            .await?;
            let preview = render_preview(
                campaign.template_body.as_deref().unwrap_or_default(),
                &components,
            );
            let message = MessageRepo::insert_outbound(
                &state.pool,
                conversation.id,
                &receipt.message_id,
                "template",
                &preview,
            )
            .await?;
            RecipientRepo::mark_sent(&state.pool, recipient.id, message.id).await?;
            CampaignRepo::increment_sent(&state.pool, campaign.id).await?;
            Ok(())
        }
        Err(e) => {
            let detail = e.detail_message();
            RecipientRepo::mark_failed(&state.pool, recipient.id, &detail).await?;
            CampaignRepo::increment_failed(&state.pool, campaign.id).await?;
            Err(AppError::WhatsApp(e))
        }
    }
}

/// Template components for one recipient: optional media header (kind
/// inferred from the attachment URL) and a body component that is
/// always present, even with no parameters.
fn build_components(campaign: &Campaign, recipient: &Recipient) -> Vec<Component> {
    let mut components = Vec::with_capacity(2);

    if let Some(url) = campaign.attachment_url.as_deref() {
        components.push(Component::header_media(infer_media_kind(url), url));
    }

    let body = match recipient.name.as_deref() {
        Some(name) => Component::body_positional(&[name]),
        None => Component::body_positional(&[]),
    };
    components.push(body);

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sherehe_db::models::status::RecipientStatus;
    use sherehe_whatsapp::template::ComponentKind;

    fn campaign(attachment_url: Option<&str>) -> Campaign {
        Campaign {
            id: 1,
            name: "Harusi ya Amina".into(),
            template_name: "wedding_invite".into(),
            template_language: "sw".into(),
            template_body: Some("Habari {{1}}, karibu!".into()),
            attachment_url: attachment_url.map(str::to_string),
            status_id: CampaignStatus::Draft.id(),
            total_recipients: 0,
            sent_count: 0,
            delivered_count: 0,
            failed_count: 0,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn recipient(name: Option<&str>) -> Recipient {
        Recipient {
            id: 1,
            campaign_id: 1,
            phone: "255712345678".into(),
            name: name.map(str::to_string),
            status_id: RecipientStatus::Pending.id(),
            message_id: None,
            error_message: None,
            sent_at: None,
            delivered_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn body_component_is_always_present() {
        let components = build_components(&campaign(None), &recipient(None));
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].kind, ComponentKind::Body);
    }

    #[test]
    fn attachment_adds_a_header_component() {
        let components = build_components(
            &campaign(Some("https://cdn.example.com/card.png")),
            &recipient(Some("Amina")),
        );
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].kind, ComponentKind::Header);
        assert_eq!(components[1].kind, ComponentKind::Body);
    }

    #[test]
    fn preview_substitutes_recipient_name() {
        let campaign = campaign(None);
        let components = build_components(&campaign, &recipient(Some("Amina")));
        let preview = render_preview(campaign.template_body.as_deref().unwrap(), &components);
        assert_eq!(preview, "Habari Amina, karibu!");
    }
}
