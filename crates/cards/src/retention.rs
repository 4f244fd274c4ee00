//! Periodic purge of expired card batches.
//!
//! Batch accounting is bounded by `expires_at`; this loop deletes rows
//! past their TTL on a fixed interval. Jobs cascade with their batch.

use std::time::Duration;

use chrono::Utc;
use sherehe_db::repositories::batch_repo::BatchRepo;
use sherehe_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the retention sweep loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Card batch retention sweeper started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Card batch retention sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match BatchRepo::delete_expired(&pool, Utc::now()).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Purged expired card batches");
                        } else {
                            tracing::debug!("No expired card batches to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Card batch retention sweep failed");
                    }
                }
            }
        }
    }
}
