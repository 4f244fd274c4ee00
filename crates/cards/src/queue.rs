//! Batch enqueueing and worker claim/report flow.
//!
//! Jobs are stored FIFO in Postgres and claimed with
//! `FOR UPDATE SKIP LOCKED`, so any number of external workers can pull
//! concurrently without double-claiming. Batch status is never stored;
//! it is derived from the counters on every read.

use serde::Serialize;
use sherehe_core::types::{DbId, Timestamp};
use sherehe_db::models::card::{BatchStatus, CardBatch, CardJob};
use sherehe_db::models::status::CardJobStatus;
use sherehe_db::repositories::batch_repo::{BatchRepo, NewCardJob};
use sherehe_db::DbPool;
use sherehe_events::bus::{EventBus, PlatformEvent};

#[derive(Debug, thiserror::Error)]
pub enum CardQueueError {
    /// An enqueue request with zero jobs.
    #[error("Card batch must contain at least one job")]
    EmptyBatch,

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Everything needed to enqueue one batch.
#[derive(Debug)]
pub struct EnqueueRequest {
    pub event_id: DbId,
    /// Shared layout applied to every job in the batch.
    pub template_layout: serde_json::Value,
    /// Where workers should put rendered cards.
    pub storage_target: String,
    pub jobs: Vec<NewCardJob>,
}

/// What the caller gets back after a successful enqueue.
#[derive(Debug, Serialize)]
pub struct EnqueueReceipt {
    pub batch_id: DbId,
    pub job_ids: Vec<DbId>,
    pub queued_count: usize,
    pub total_jobs: i32,
}

/// One job's reported outcome inside a [`BatchReport`]. Unreported
/// jobs appear with a pending/processing status and no result.
#[derive(Debug, Serialize)]
pub struct JobResult {
    pub job_id: DbId,
    pub invitation_id: DbId,
    pub status: &'static str,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub reported_at: Option<Timestamp>,
}

/// Snapshot of a batch: counters, derived status, per-job results.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub batch_id: DbId,
    pub event_id: DbId,
    pub status: BatchStatus,
    pub total_jobs: i32,
    pub completed_jobs: i32,
    pub failed_jobs: i32,
    pub expires_at: Timestamp,
    pub results: Vec<JobResult>,
}

pub struct CardQueue;

impl CardQueue {
    /// Create a batch with one job per invitation. The batch row and
    /// its FIFO job list appear in a single transaction.
    pub async fn enqueue(
        pool: &DbPool,
        request: EnqueueRequest,
        ttl_hours: i64,
    ) -> Result<EnqueueReceipt, CardQueueError> {
        if request.jobs.is_empty() {
            return Err(CardQueueError::EmptyBatch);
        }

        let (batch, jobs) = BatchRepo::create_with_jobs(
            pool,
            request.event_id,
            &request.template_layout,
            &request.storage_target,
            &request.jobs,
            ttl_hours,
        )
        .await?;

        tracing::info!(
            batch_id = batch.id,
            event_id = batch.event_id,
            total_jobs = batch.total_jobs,
            "Card batch enqueued"
        );

        Ok(EnqueueReceipt {
            batch_id: batch.id,
            job_ids: jobs.iter().map(|job| job.id).collect(),
            queued_count: jobs.len(),
            total_jobs: batch.total_jobs,
        })
    }

    /// Batch snapshot with derived status and the results reported so
    /// far. `None` when the batch does not exist (or was swept).
    pub async fn status(
        pool: &DbPool,
        batch_id: DbId,
    ) -> Result<Option<BatchReport>, CardQueueError> {
        let Some(batch) = BatchRepo::find_batch(pool, batch_id).await? else {
            return Ok(None);
        };
        let jobs = BatchRepo::list_jobs(pool, batch_id).await?;

        Ok(Some(Self::report_from(batch, &jobs)))
    }

    fn report_from(batch: CardBatch, jobs: &[CardJob]) -> BatchReport {
        let results = jobs
            .iter()
            .map(|job| JobResult {
                job_id: job.id,
                invitation_id: job.invitation_id,
                status: job_status_label(job.status_id),
                result_url: job.result_url.clone(),
                error_message: job.error_message.clone(),
                reported_at: job.reported_at,
            })
            .collect();

        BatchReport {
            batch_id: batch.id,
            event_id: batch.event_id,
            status: BatchStatus::derive(
                batch.total_jobs,
                batch.completed_jobs,
                batch.failed_jobs,
            ),
            total_jobs: batch.total_jobs,
            completed_jobs: batch.completed_jobs,
            failed_jobs: batch.failed_jobs,
            expires_at: batch.expires_at,
            results,
        }
    }

    /// Hand the oldest pending job to a worker, marking it processing.
    pub async fn claim(pool: &DbPool) -> Result<Option<CardJob>, CardQueueError> {
        Ok(BatchRepo::claim_next_job(pool).await?)
    }

    /// Record a worker's result. Idempotent per job; re-reports of a
    /// terminal job return `None` without touching counters. Publishes
    /// `cards.batch_completed` once every job has reported.
    pub async fn report(
        pool: &DbPool,
        events: &EventBus,
        job_id: DbId,
        success: bool,
        result_url: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<Option<CardBatch>, CardQueueError> {
        let Some(batch) =
            BatchRepo::report_job_result(pool, job_id, success, result_url, error_message).await?
        else {
            tracing::debug!(job_id, "Ignoring duplicate card job report");
            return Ok(None);
        };

        let reported = batch.completed_jobs + batch.failed_jobs;
        if reported >= batch.total_jobs {
            let status = BatchStatus::derive(
                batch.total_jobs,
                batch.completed_jobs,
                batch.failed_jobs,
            );
            tracing::info!(
                batch_id = batch.id,
                completed = batch.completed_jobs,
                failed = batch.failed_jobs,
                ?status,
                "Card batch finished"
            );
            events.publish(
                PlatformEvent::new("cards.batch_completed")
                    .with_source("card_batch", batch.id)
                    .with_payload(serde_json::json!({
                        "batch_id": batch.id,
                        "event_id": batch.event_id,
                        "status": status,
                        "total_jobs": batch.total_jobs,
                        "completed_jobs": batch.completed_jobs,
                        "failed_jobs": batch.failed_jobs,
                    })),
            );
        }

        Ok(Some(batch))
    }
}

fn job_status_label(status_id: i16) -> &'static str {
    match status_id {
        id if id == CardJobStatus::Pending.id() => "pending",
        id if id == CardJobStatus::Processing.id() => "processing",
        id if id == CardJobStatus::Completed.id() => "completed",
        id if id == CardJobStatus::Failed.id() => "failed",
        _ => "unknown",
    }
}
