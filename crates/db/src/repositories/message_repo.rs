//! Repository for the `messages` table.
//!
//! Status transitions are enforced in SQL: a new status only applies
//! when its id is strictly greater than the stored one, so out-of-order
//! delivery webhooks can never regress a message (once `read`, a late
//! `delivered` is ignored; `failed` is the maximum and thus terminal).

use sqlx::PgPool;
use sherehe_core::types::{DbId, Timestamp};

use crate::models::message::Message;
use crate::models::status::{Direction, MessageStatus};

/// Column list for `messages` queries.
const COLUMNS: &str = "\
    id, conversation_id, wa_message_id, direction, content_type, content, \
    status_id, error_detail, sent_at, delivered_at, read_at, failed_at, \
    created_at";

/// Default page size for message history.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for message history.
const MAX_LIMIT: i64 = 200;

/// Outcome of a delivery-status update.
#[derive(Debug)]
pub enum StatusUpdateOutcome {
    /// The transition applied; the updated row is returned.
    Updated(Message),
    /// The message exists but the transition would regress its status.
    Ignored,
    /// No message carries this provider id (sent through a side
    /// channel); tolerated and logged by the caller.
    Unknown,
}

pub struct MessageRepo;

impl MessageRepo {
    /// Store an inbound message. Inbound rows are created directly in
    /// `delivered` state -- they have, by definition, arrived.
    pub async fn insert_inbound(
        pool: &PgPool,
        conversation_id: DbId,
        wa_message_id: &str,
        content_type: &str,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages \
                 (conversation_id, wa_message_id, direction, content_type, content, \
                  status_id, delivered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(wa_message_id)
            .bind(Direction::Inbound.id())
            .bind(content_type)
            .bind(content)
            .bind(MessageStatus::Delivered.id())
            .fetch_one(pool)
            .await
    }

    /// Store an outbound message accepted by the provider.
    pub async fn insert_outbound(
        pool: &PgPool,
        conversation_id: DbId,
        wa_message_id: &str,
        content_type: &str,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages \
                 (conversation_id, wa_message_id, direction, content_type, content, \
                  status_id, sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(wa_message_id)
            .bind(Direction::Outbound.id())
            .bind(content_type)
            .bind(content)
            .bind(MessageStatus::Sent.id())
            .fetch_one(pool)
            .await
    }

    /// Apply a delivery-status update keyed by provider message id.
    ///
    /// The monotonic guard lives in the WHERE clause; when it rejects
    /// the update the row is left untouched and the transition is
    /// reported as [`StatusUpdateOutcome::Ignored`].
    pub async fn update_status(
        pool: &PgPool,
        wa_message_id: &str,
        status: MessageStatus,
        timestamp: Option<Timestamp>,
        error_detail: Option<&str>,
    ) -> Result<StatusUpdateOutcome, sqlx::Error> {
        let stamp_column = match status {
            MessageStatus::Queued => "created_at",
            MessageStatus::Sent => "sent_at",
            MessageStatus::Delivered => "delivered_at",
            MessageStatus::Read => "read_at",
            MessageStatus::Failed => "failed_at",
        };

        let query = format!(
            "UPDATE messages \
             SET status_id = $2, \
                 {stamp_column} = COALESCE($3, NOW()), \
                 error_detail = COALESCE($4, error_detail) \
             WHERE wa_message_id = $1 AND status_id < $2 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Message>(&query)
            .bind(wa_message_id)
            .bind(status.id())
            .bind(timestamp)
            .bind(error_detail)
            .fetch_optional(pool)
            .await?;

        if let Some(message) = updated {
            return Ok(StatusUpdateOutcome::Updated(message));
        }

        // Distinguish a regression from an unknown provider id.
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE wa_message_id = $1",
        )
        .bind(wa_message_id)
        .fetch_one(pool)
        .await?;

        if exists > 0 {
            Ok(StatusUpdateOutcome::Ignored)
        } else {
            Ok(StatusUpdateOutcome::Unknown)
        }
    }

    /// Message history for one conversation, oldest first.
    pub async fn list_by_conversation(
        pool: &PgPool,
        conversation_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE conversation_id = $1 \
             ORDER BY created_at ASC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(limit)
            .bind(offset.unwrap_or(0))
            .fetch_all(pool)
            .await
    }
}
