//! Handlers for the card-generation queue.
//!
//! Organizer-facing: enqueue a batch and poll its status. Worker-facing:
//! claim the next job and report a result.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use sherehe_cards::queue::{CardQueue, EnqueueReceipt, EnqueueRequest};
use sherehe_core::error::CoreError;
use sherehe_core::types::DbId;
use sherehe_db::models::card::CardBatch;
use sherehe_db::repositories::batch_repo::NewCardJob;
use sherehe_db::repositories::InvitationRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of POST /api/v1/cards/batches.
#[derive(Debug, Deserialize)]
pub struct EnqueueBatch {
    pub event_id: DbId,
    /// Shared layout every card in the batch renders against.
    pub template_layout: serde_json::Value,
    #[serde(default = "default_storage_target")]
    pub storage_target: String,
    /// One card per invitation; substitutions are derived from the
    /// invitation.
    pub invitation_ids: Vec<DbId>,
}

fn default_storage_target() -> String {
    "local".to_string()
}

/// POST /api/v1/cards/batches -- enqueue one card per invitation.
pub async fn enqueue(
    State(state): State<AppState>,
    Json(input): Json<EnqueueBatch>,
) -> AppResult<(StatusCode, Json<EnqueueReceipt>)> {
    if input.invitation_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "invitation_ids must not be empty".to_string(),
        )));
    }

    let invitations = InvitationRepo::find_by_ids(&state.pool, &input.invitation_ids).await?;
    if invitations.len() != input.invitation_ids.len() {
        return Err(AppError::Core(CoreError::Validation(
            "One or more invitation ids do not exist".to_string(),
        )));
    }

    let jobs: Vec<NewCardJob> = invitations
        .iter()
        .map(|invitation| NewCardJob {
            invitation_id: invitation.id,
            substitutions: json!({
                "guest_name": invitation.guest_name,
                "phone": invitation.phone,
            }),
        })
        .collect();

    let receipt = CardQueue::enqueue(
        &state.pool,
        EnqueueRequest {
            event_id: input.event_id,
            template_layout: input.template_layout,
            storage_target: input.storage_target,
            jobs,
        },
        state.config.card_batch_ttl_hours,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/v1/cards/batches/{id} -- counters, derived status, results.
pub async fn batch_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<sherehe_cards::BatchReport>>> {
    let report = CardQueue::status(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CardBatch",
            id,
        }))?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/cards/jobs/claim -- worker pulls the oldest pending job.
///
/// 204 when the queue is empty.
pub async fn claim_job(State(state): State<AppState>) -> AppResult<Response> {
    match CardQueue::claim(&state.pool).await? {
        Some(job) => Ok(Json(DataResponse { data: job }).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Body of a worker's job result callback.
#[derive(Debug, Deserialize)]
pub struct JobResultBody {
    pub success: bool,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
}

/// POST /api/v1/cards/jobs/{id}/result -- worker reports one outcome.
///
/// Duplicate reports return the unmodified batch-less acknowledgement.
pub async fn report_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<JobResultBody>,
) -> AppResult<Json<DataResponse<Option<CardBatch>>>> {
    let batch = CardQueue::report(
        &state.pool,
        &state.event_bus,
        id,
        input.success,
        input.result_url.as_deref(),
        input.error_message.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: batch }))
}
