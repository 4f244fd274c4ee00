//! Message and conversation-entry models.

use serde::Serialize;
use sherehe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    /// Provider message id (`wamid....`); present once the provider has
    /// accepted the message, absent for locally failed sends.
    pub wa_message_id: Option<String>,
    pub direction: StatusId,
    pub content_type: String,
    pub content: String,
    pub status_id: StatusId,
    pub error_detail: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub read_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
