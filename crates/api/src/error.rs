use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sherehe_cards::queue::CardQueueError;
use sherehe_core::error::CoreError;
use sherehe_whatsapp::client::WhatsAppError;
use sherehe_whatsapp::flow::FlowCodecError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent
/// `{error, code}` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `sherehe_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A provider-side failure on an outbound WhatsApp call.
    #[error("Provider error: {0}")]
    WhatsApp(#[from] WhatsAppError),

    /// A Flow codec failure. Signature mismatches map to 432 and
    /// decryption failures to 421, the statuses the provider keys its
    /// retry behaviour on.
    #[error(transparent)]
    Flow(#[from] FlowCodecError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<CardQueueError> for AppError {
    fn from(err: CardQueueError) -> Self {
        match err {
            CardQueueError::EmptyBatch => AppError::Core(CoreError::Validation(err.to_string())),
            CardQueueError::Db(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::State(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Provider errors ---
            AppError::WhatsApp(err) => {
                tracing::error!(error = %err, "WhatsApp provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    err.detail_message(),
                )
            }

            // --- Flow codec errors ---
            AppError::Flow(FlowCodecError::SignatureInvalid) => (
                flow_status(432),
                "SIGNATURE_INVALID",
                "Request signature verification failed".to_string(),
            ),
            AppError::Flow(FlowCodecError::Encrypt) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
            AppError::Flow(err) => {
                tracing::warn!(error = %err, "Flow payload could not be decrypted");
                (
                    flow_status(421),
                    "DECRYPTION_FAILED",
                    "Request payload could not be decrypted".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// The Flow endpoint contract uses non-standard statuses (432, 421)
/// that have no `StatusCode` constants.
fn flow_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_statuses_are_representable() {
        assert_eq!(flow_status(432).as_u16(), 432);
        assert_eq!(flow_status(421).as_u16(), 421);
    }

    #[test]
    fn state_errors_map_to_conflict() {
        let err = AppError::Core(CoreError::State("campaign is not in draft".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn signature_failure_maps_to_432() {
        let err = AppError::Flow(FlowCodecError::SignatureInvalid);
        assert_eq!(err.into_response().status().as_u16(), 432);
    }

    #[test]
    fn decrypt_failure_maps_to_421() {
        let err = AppError::Flow(FlowCodecError::Decrypt);
        assert_eq!(err.into_response().status().as_u16(), 421);
    }
}
