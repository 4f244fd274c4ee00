//! Campaign entity model and DTOs.

use serde::{Deserialize, Serialize};
use sherehe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub name: String,
    pub template_name: String,
    pub template_language: String,
    /// Canonical template body text with `{{n}}` / named placeholders,
    /// used for human-readable previews of sent messages.
    pub template_body: Option<String>,
    pub attachment_url: Option<String>,
    pub status_id: StatusId,
    pub total_recipients: i32,
    pub sent_count: i32,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/v1/campaigns`.
#[derive(Debug, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub template_name: String,
    #[serde(default = "default_language")]
    pub template_language: String,
    pub template_body: Option<String>,
    pub attachment_url: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

/// DTO for `PUT /api/v1/campaigns/{id}`. Every field is optional;
/// applying any edit resets the campaign to draft.
#[derive(Debug, Deserialize)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub template_name: Option<String>,
    pub template_language: Option<String>,
    pub template_body: Option<String>,
    pub attachment_url: Option<String>,
}
