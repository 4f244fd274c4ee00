//! Repository for the `campaigns` table.
//!
//! Lifecycle transitions use conditional UPDATEs with `rows_affected`
//! guards so concurrent requests cannot double-start a campaign.

use sqlx::PgPool;
use sherehe_core::types::DbId;

use crate::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use crate::models::status::CampaignStatus;

/// Column list for `campaigns` queries.
const COLUMNS: &str = "\
    id, name, template_name, template_language, template_body, \
    attachment_url, status_id, total_recipients, sent_count, \
    delivered_count, failed_count, started_at, completed_at, \
    created_at, updated_at";

/// Default page size for campaign listing.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for campaign listing.
const MAX_LIMIT: i64 = 100;

pub struct CampaignRepo;

impl CampaignRepo {
    /// Create a new draft campaign.
    pub async fn create(pool: &PgPool, input: &CreateCampaign) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns \
                 (name, template_name, template_language, template_body, attachment_url, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(&input.name)
            .bind(&input.template_name)
            .bind(&input.template_language)
            .bind(&input.template_body)
            .bind(&input.attachment_url)
            .bind(CampaignStatus::Draft.id())
            .fetch_one(pool)
            .await
    }

    /// Find a campaign by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List campaigns, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(limit)
            .bind(offset.unwrap_or(0))
            .fetch_all(pool)
            .await
    }

    /// Apply an edit and reset the campaign to draft.
    ///
    /// Editing is how a completed or failed campaign becomes
    /// re-sendable, so every edit zeroes the counters and clears the
    /// run timestamps. Recipient rows are reset separately via
    /// [`RecipientRepo::reset_to_pending`](crate::repositories::RecipientRepo::reset_to_pending).
    pub async fn update_and_reset(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCampaign,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET \
                 name = COALESCE($2, name), \
                 template_name = COALESCE($3, template_name), \
                 template_language = COALESCE($4, template_language), \
                 template_body = COALESCE($5, template_body), \
                 attachment_url = COALESCE($6, attachment_url), \
                 status_id = $7, \
                 total_recipients = 0, sent_count = 0, \
                 delivered_count = 0, failed_count = 0, \
                 started_at = NULL, completed_at = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.template_name)
            .bind(&input.template_language)
            .bind(&input.template_body)
            .bind(&input.attachment_url)
            .bind(CampaignStatus::Draft.id())
            .fetch_optional(pool)
            .await
    }

    /// Flip a draft campaign to `sending` and record the run size.
    ///
    /// Returns `false` when the campaign was not in draft -- the caller
    /// raced another send request.
    pub async fn begin_sending(pool: &PgPool, id: DbId, total: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE campaigns \
             SET status_id = $2, total_recipients = $3, sent_count = 0, \
                 delivered_count = 0, failed_count = 0, \
                 started_at = NOW(), completed_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(CampaignStatus::Sending.id())
        .bind(total)
        .bind(CampaignStatus::Draft.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically bump the sent counter.
    pub async fn increment_sent(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaigns SET sent_count = sent_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Atomically bump the failed counter.
    pub async fn increment_failed(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaigns SET failed_count = failed_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Atomically bump the delivered counter.
    pub async fn increment_delivered(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaigns \
             SET delivered_count = delivered_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Close out a sending campaign with its terminal status.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        status: CampaignStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaigns \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(status.id())
        .bind(CampaignStatus::Sending.id())
        .execute(pool)
        .await?;
        Ok(())
    }
}
