//! Campaign recipient model and import report DTOs.

use serde::Serialize;
use sherehe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `campaign_recipients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipient {
    pub id: DbId,
    pub campaign_id: DbId,
    pub phone: String,
    pub name: Option<String>,
    pub status_id: StatusId,
    /// Outbound `messages` row created when this recipient was sent to.
    pub message_id: Option<DbId>,
    pub error_message: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// One rejected row from a recipient import.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportRowError {
    /// 1-based file row number, header included (data starts at row 2).
    pub row: usize,
    pub error: String,
}

/// Result of a bulk recipient import.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}
