//! Repository for the `campaign_recipients` table.

use sqlx::PgPool;
use sherehe_core::types::DbId;

use crate::models::recipient::Recipient;
use crate::models::status::RecipientStatus;

/// Column list for `campaign_recipients` queries.
const COLUMNS: &str = "\
    id, campaign_id, phone, name, status_id, message_id, error_message, \
    sent_at, delivered_at, created_at";

pub struct RecipientRepo;

impl RecipientRepo {
    /// Add one recipient to a campaign.
    ///
    /// The `uq_campaign_recipients_phone` constraint rejects duplicate
    /// phones within a campaign; the violation surfaces as a sqlx
    /// database error and maps to 409 at the API boundary.
    pub async fn add(
        pool: &PgPool,
        campaign_id: DbId,
        phone: &str,
        name: Option<&str>,
    ) -> Result<Recipient, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaign_recipients (campaign_id, phone, name, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(campaign_id)
            .bind(phone)
            .bind(name)
            .bind(RecipientStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// All phones already present in a campaign (import dedup check).
    pub async fn existing_phones(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT phone FROM campaign_recipients WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await
    }

    /// All recipients of a campaign in insertion order.
    pub async fn list_by_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaign_recipients \
             WHERE campaign_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    /// Snapshot the pending recipients for a send run, in FIFO order.
    pub async fn snapshot_pending(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaign_recipients \
             WHERE campaign_id = $1 AND status_id = $2 ORDER BY id ASC"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(campaign_id)
            .bind(RecipientStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Mark one recipient sent and link its outbound message row.
    pub async fn mark_sent(
        pool: &PgPool,
        id: DbId,
        message_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaign_recipients \
             SET status_id = $2, message_id = $3, sent_at = NOW(), error_message = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(RecipientStatus::Sent.id())
        .bind(message_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark one recipient failed with the provider's error detail.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaign_recipients \
             SET status_id = $2, error_message = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(RecipientStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Stamp `delivered_at` on the recipient linked to an outbound
    /// message. Returns the owning campaign id when a recipient
    /// matched, so the caller can bump the campaign counter.
    pub async fn mark_delivered_by_message(
        pool: &PgPool,
        message_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "UPDATE campaign_recipients \
             SET delivered_at = NOW() \
             WHERE message_id = $1 AND delivered_at IS NULL \
             RETURNING campaign_id",
        )
        .bind(message_id)
        .fetch_optional(pool)
        .await
    }

    /// Reset every non-pending recipient of a campaign back to pending,
    /// clearing run state. Part of the edit-resets-to-draft contract.
    pub async fn reset_to_pending(pool: &PgPool, campaign_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE campaign_recipients \
             SET status_id = $2, message_id = NULL, error_message = NULL, \
                 sent_at = NULL, delivered_at = NULL \
             WHERE campaign_id = $1 AND status_id <> $2",
        )
        .bind(campaign_id)
        .bind(RecipientStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
