//! Handlers for the `/conversations` resource (read-only surface).

use axum::extract::{Path, Query, State};
use axum::Json;
use sherehe_core::error::CoreError;
use sherehe_core::types::DbId;
use sherehe_db::models::conversation::Conversation;
use sherehe_db::models::message::Message;
use sherehe_db::repositories::{ConversationRepo, MessageRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::campaigns::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/conversations -- most recently active first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Conversation>>>> {
    let conversations = ConversationRepo::list(&state.pool, params.limit, params.offset).await?;
    Ok(Json(DataResponse {
        data: conversations,
    }))
}

/// GET /api/v1/conversations/{id}/messages -- history, oldest first.
pub async fn messages(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    // 404 for a conversation that never existed, empty list for one
    // with no messages.
    ConversationRepo::phone_for(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Conversation",
            id,
        }))?;

    let messages =
        MessageRepo::list_by_conversation(&state.pool, id, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: messages }))
}
