use serde::{Deserialize, Serialize};
use sherehe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `invitations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invitation {
    pub id: DbId,
    pub event_id: DbId,
    pub guest_name: String,
    pub phone: String,
    pub rsvp_status_id: StatusId,
    pub rsvp_at: Option<Timestamp>,
    pub rsvp_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/v1/events/{id}/invitations`.
#[derive(Debug, Deserialize)]
pub struct CreateInvitation {
    pub guest_name: String,
    pub phone: String,
}
