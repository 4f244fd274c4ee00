//! Repository for the `card_batches` and `card_jobs` tables.
//!
//! Batch counters are incremented with atomic `SET x = x + 1` updates
//! because multiple external workers report results concurrently.
//! Job claiming uses `FOR UPDATE SKIP LOCKED` so two workers can never
//! pop the same job.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use sherehe_core::types::{DbId, Timestamp};

use crate::models::card::{CardBatch, CardJob};
use crate::models::status::CardJobStatus;

/// Column list for `card_batches` queries.
const BATCH_COLUMNS: &str = "\
    id, event_id, total_jobs, completed_jobs, failed_jobs, expires_at, \
    created_at";

/// Column list for `card_jobs` queries.
const JOB_COLUMNS: &str = "\
    id, batch_id, event_id, invitation_id, substitutions, template_layout, \
    storage_target, status_id, result_url, error_message, reported_at, \
    created_at";

/// Job payload for batch creation. The batch id is assigned inside the
/// creation transaction.
#[derive(Debug)]
pub struct NewCardJob {
    pub invitation_id: DbId,
    pub substitutions: serde_json::Value,
}

pub struct BatchRepo;

impl BatchRepo {
    /// Create a batch and all of its jobs in one transaction, so batch
    /// metadata and the FIFO job list appear atomically.
    pub async fn create_with_jobs(
        pool: &PgPool,
        event_id: DbId,
        template_layout: &serde_json::Value,
        storage_target: &str,
        jobs: &[NewCardJob],
        ttl_hours: i64,
    ) -> Result<(CardBatch, Vec<CardJob>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let expires_at = Utc::now() + Duration::hours(ttl_hours);
        let batch_query = format!(
            "INSERT INTO card_batches (event_id, total_jobs, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING {BATCH_COLUMNS}"
        );
        let batch = sqlx::query_as::<_, CardBatch>(&batch_query)
            .bind(event_id)
            .bind(jobs.len() as i32)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        let job_query = format!(
            "INSERT INTO card_jobs \
                 (batch_id, event_id, invitation_id, substitutions, \
                  template_layout, storage_target, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {JOB_COLUMNS}"
        );
        let mut created = Vec::with_capacity(jobs.len());
        for job in jobs {
            let row = sqlx::query_as::<_, CardJob>(&job_query)
                .bind(batch.id)
                .bind(event_id)
                .bind(job.invitation_id)
                .bind(&job.substitutions)
                .bind(template_layout)
                .bind(storage_target)
                .bind(CardJobStatus::Pending.id())
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok((batch, created))
    }

    /// Find a batch by its ID.
    pub async fn find_batch(pool: &PgPool, id: DbId) -> Result<Option<CardBatch>, sqlx::Error> {
        let query = format!("SELECT {BATCH_COLUMNS} FROM card_batches WHERE id = $1");
        sqlx::query_as::<_, CardBatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All jobs of a batch in enqueue (FIFO) order.
    pub async fn list_jobs(pool: &PgPool, batch_id: DbId) -> Result<Vec<CardJob>, sqlx::Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM card_jobs WHERE batch_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, CardJob>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim the oldest pending job for an external worker.
    pub async fn claim_next_job(pool: &PgPool) -> Result<Option<CardJob>, sqlx::Error> {
        let query = format!(
            "UPDATE card_jobs \
             SET status_id = $1 \
             WHERE id = ( \
                 SELECT id FROM card_jobs \
                 WHERE status_id = $2 \
                 ORDER BY id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, CardJob>(&query)
            .bind(CardJobStatus::Processing.id())
            .bind(CardJobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Record a worker's result for one job and bump the batch counter.
    ///
    /// Idempotent per job: a job already in a terminal state is left
    /// alone and `None` is returned. On success the updated batch row
    /// (post-increment) is returned.
    pub async fn report_job_result(
        pool: &PgPool,
        job_id: DbId,
        success: bool,
        result_url: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<Option<CardBatch>, sqlx::Error> {
        let status = if success {
            CardJobStatus::Completed
        } else {
            CardJobStatus::Failed
        };

        let job_query = format!(
            "UPDATE card_jobs \
             SET status_id = $2, result_url = $3, error_message = $4, reported_at = NOW() \
             WHERE id = $1 AND status_id IN ($5, $6) \
             RETURNING {JOB_COLUMNS}"
        );
        let job = sqlx::query_as::<_, CardJob>(&job_query)
            .bind(job_id)
            .bind(status.id())
            .bind(result_url)
            .bind(error_message)
            .bind(CardJobStatus::Pending.id())
            .bind(CardJobStatus::Processing.id())
            .fetch_optional(pool)
            .await?;

        let Some(job) = job else {
            return Ok(None);
        };

        let counter = if success {
            "completed_jobs"
        } else {
            "failed_jobs"
        };
        let batch_query = format!(
            "UPDATE card_batches SET {counter} = {counter} + 1 \
             WHERE id = $1 \
             RETURNING {BATCH_COLUMNS}"
        );
        let batch = sqlx::query_as::<_, CardBatch>(&batch_query)
            .bind(job.batch_id)
            .fetch_one(pool)
            .await?;

        Ok(Some(batch))
    }

    /// Delete batches past their TTL. Jobs cascade with their batch.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM card_batches WHERE expires_at < $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
