//! Card-generation batch and job models.

use serde::Serialize;
use sherehe_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `card_batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CardBatch {
    pub id: DbId,
    pub event_id: DbId,
    pub total_jobs: i32,
    pub completed_jobs: i32,
    pub failed_jobs: i32,
    /// Batch accounting is bounded: rows past this moment are swept.
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// A row from the `card_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CardJob {
    pub id: DbId,
    pub batch_id: DbId,
    pub event_id: DbId,
    pub invitation_id: DbId,
    /// Per-guest placeholder values, e.g. `{"guest_name": "Amina"}`.
    pub substitutions: serde_json::Value,
    /// Shared template layout for every job in the batch.
    pub template_layout: serde_json::Value,
    pub storage_target: String,
    pub status_id: StatusId,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub reported_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Derived batch status, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    /// Derive the batch status from its counters.
    ///
    /// All jobs reported: `failed` if any failed, else `completed`.
    /// Some reported: `processing`. None reported: `queued`.
    pub fn derive(total: i32, completed: i32, failed: i32) -> Self {
        if completed + failed >= total && total > 0 {
            if failed > 0 {
                BatchStatus::Failed
            } else {
                BatchStatus::Completed
            }
        } else if completed + failed > 0 {
            BatchStatus::Processing
        } else {
            BatchStatus::Queued
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_batch_is_queued() {
        assert_eq!(BatchStatus::derive(5, 0, 0), BatchStatus::Queued);
    }

    #[test]
    fn partially_reported_batch_is_processing() {
        assert_eq!(BatchStatus::derive(5, 2, 0), BatchStatus::Processing);
        assert_eq!(BatchStatus::derive(5, 2, 1), BatchStatus::Processing);
    }

    #[test]
    fn fully_reported_batch_without_failures_is_completed() {
        assert_eq!(BatchStatus::derive(5, 5, 0), BatchStatus::Completed);
    }

    #[test]
    fn any_failure_in_a_finished_batch_is_failed() {
        // 3 successes + 2 failures out of 5 resolves to failed.
        assert_eq!(BatchStatus::derive(5, 3, 2), BatchStatus::Failed);
    }
}
