//! Repository for the `conversations` table.

use sqlx::PgPool;
use sherehe_core::types::DbId;

use crate::models::conversation::Conversation;

/// Column list for `conversations` queries.
const COLUMNS: &str = "\
    id, phone, contact_name, requires_template, last_message_at, \
    created_at, updated_at";

/// Default page size for conversation listing.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for conversation listing.
const MAX_LIMIT: i64 = 100;

pub struct ConversationRepo;

impl ConversationRepo {
    /// Find or create the conversation for a normalized phone number,
    /// refreshing `last_message_at` and the contact name when one is
    /// provided.
    pub async fn upsert(
        pool: &PgPool,
        phone: &str,
        contact_name: Option<&str>,
    ) -> Result<Conversation, sqlx::Error> {
        let query = format!(
            "INSERT INTO conversations (phone, contact_name, last_message_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (phone) DO UPDATE SET \
                 contact_name = COALESCE(EXCLUDED.contact_name, conversations.contact_name), \
                 last_message_at = NOW(), \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(phone)
            .bind(contact_name)
            .fetch_one(pool)
            .await
    }

    /// Set or clear the `requires_template` flag for a phone number.
    ///
    /// Set when a failure status carries the provider's session-window
    /// error; cleared when an inbound message reopens the window.
    /// Returns `false` if no conversation exists for the phone.
    pub async fn set_requires_template(
        pool: &PgPool,
        phone: &str,
        value: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE conversations \
             SET requires_template = $2, updated_at = NOW() \
             WHERE phone = $1",
        )
        .bind(phone)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a conversation by its normalized phone number.
    pub async fn find_by_phone(
        pool: &PgPool,
        phone: &str,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversations WHERE phone = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Phone number for a conversation id (used when enriching status
    /// events with the conversation key).
    pub async fn phone_for(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT phone FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List conversations, most recently active first.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Conversation>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM conversations \
             ORDER BY last_message_at DESC NULLS LAST \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(limit)
            .bind(offset.unwrap_or(0))
            .fetch_all(pool)
            .await
    }
}
