use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An operation was attempted against an entity whose lifecycle
    /// status does not permit it (e.g. sending a non-draft campaign).
    #[error("Invalid state: {0}")]
    State(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
