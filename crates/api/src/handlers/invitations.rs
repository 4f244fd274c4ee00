//! Handlers for event invitations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sherehe_core::error::CoreError;
use sherehe_core::phone::normalize_phone;
use sherehe_core::types::DbId;
use sherehe_db::models::invitation::{CreateInvitation, Invitation};
use sherehe_db::repositories::InvitationRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/events/{event_id}/invitations
pub async fn create(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<CreateInvitation>,
) -> AppResult<(StatusCode, Json<Invitation>)> {
    if input.guest_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Guest name must not be empty".to_string(),
        )));
    }
    let phone = normalize_phone(&input.phone).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Invalid phone number: {}",
            input.phone
        )))
    })?;

    let invitation =
        InvitationRepo::create(&state.pool, event_id, input.guest_name.trim(), &phone).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

/// GET /api/v1/events/{event_id}/invitations
pub async fn list_by_event(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Invitation>>>> {
    let invitations = InvitationRepo::list_by_event(&state.pool, event_id).await?;
    Ok(Json(DataResponse { data: invitations }))
}

/// GET /api/v1/invitations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Invitation>> {
    let invitation = InvitationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Invitation",
            id,
        }))?;
    Ok(Json(invitation))
}
