use serde::Serialize;
use sherehe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `conversations` table, keyed by normalized phone.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub phone: String,
    pub contact_name: Option<String>,
    /// Set when the provider reports the 24-hour session window has
    /// lapsed; future sends to this phone must use a template.
    pub requires_template: bool,
    pub last_message_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
