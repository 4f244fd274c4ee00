//! Handlers for the `/campaigns` resource.

use std::collections::HashSet;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sherehe_core::error::CoreError;
use sherehe_core::phone::normalize_phone;
use sherehe_core::types::DbId;
use sherehe_db::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use sherehe_db::models::recipient::{ImportReport, Recipient};
use sherehe_db::models::status::CampaignStatus;
use sherehe_db::repositories::{CampaignRepo, RecipientRepo};

use crate::engine::campaign as runner;
use crate::engine::import;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Pagination query parameters shared by list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/v1/campaigns
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<Campaign>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Campaign name must not be empty".to_string(),
        )));
    }
    let campaign = CampaignRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /api/v1/campaigns
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Campaign>>>> {
    let campaigns = CampaignRepo::list(&state.pool, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: campaigns }))
}

/// GET /api/v1/campaigns/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Campaign>> {
    let campaign = CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;
    Ok(Json(campaign))
}

/// PUT /api/v1/campaigns/{id}
///
/// Any edit resets the campaign to draft and every recipient back to
/// pending, which is how a finished campaign becomes re-sendable.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCampaign>,
) -> AppResult<Json<Campaign>> {
    let current = CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;
    if current.status_id == CampaignStatus::Sending.id() {
        return Err(AppError::Core(CoreError::State(
            "Campaign cannot be edited while sending".to_string(),
        )));
    }

    let campaign = CampaignRepo::update_and_reset(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;
    let reset = RecipientRepo::reset_to_pending(&state.pool, id).await?;
    tracing::info!(campaign_id = id, reset, "Campaign edited and reset to draft");
    Ok(Json(campaign))
}

/// Body of a manual recipient add.
#[derive(Debug, Deserialize)]
pub struct AddRecipient {
    pub phone: String,
    pub name: Option<String>,
}

/// POST /api/v1/campaigns/{id}/recipients
pub async fn add_recipient(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddRecipient>,
) -> AppResult<(StatusCode, Json<Recipient>)> {
    ensure_exists(&state, id).await?;

    let phone = normalize_phone(&input.phone).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Invalid phone number: {}",
            input.phone
        )))
    })?;

    // The unique constraint turns a duplicate phone into a 409.
    let recipient = RecipientRepo::add(&state.pool, id, &phone, input.name.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(recipient)))
}

/// POST /api/v1/campaigns/{id}/recipients/import -- multipart CSV upload.
pub async fn import_recipients(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportReport>> {
    ensure_exists(&state, id).await?;

    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Unreadable upload: {e}")))?;
            file = Some(bytes.to_vec());
        }
    }
    let file = file.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    let existing: HashSet<String> = RecipientRepo::existing_phones(&state.pool, id)
        .await?
        .into_iter()
        .collect();

    let plan = import::parse_recipients(&file, &existing)?;

    let mut imported = 0;
    let mut errors = plan.errors;
    for row in &plan.rows {
        match RecipientRepo::add(&state.pool, id, &row.phone, row.name.as_deref()).await {
            Ok(_) => imported += 1,
            Err(e) => errors.push(sherehe_db::models::recipient::ImportRowError {
                row: row.row,
                error: format!("Could not save recipient: {e}"),
            }),
        }
    }

    errors.sort_by_key(|error| error.row);
    let report = ImportReport {
        total: plan.total,
        imported,
        failed: errors.len(),
        errors,
    };
    tracing::info!(
        campaign_id = id,
        total = report.total,
        imported = report.imported,
        failed = report.failed,
        "Recipient import finished"
    );
    Ok(Json(report))
}

/// GET /api/v1/campaigns/{id}/progress
pub async fn progress(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let campaign = CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;
    let recipients = RecipientRepo::list_by_campaign(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "campaign": campaign,
            "recipients": recipients,
        }),
    }))
}

/// POST /api/v1/campaigns/{id}/send
///
/// 202: the send loop continues after this response.
pub async fn send(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<Campaign>)> {
    let campaign = runner::start(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(campaign)))
}

async fn ensure_exists(state: &AppState, id: DbId) -> AppResult<()> {
    CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;
    Ok(())
}
