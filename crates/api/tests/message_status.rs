//! Integration tests for delivery-status bookkeeping against a real
//! database. Provider status webhooks can arrive out of order, so the
//! store must never let a late update regress a message.

use sqlx::PgPool;

use sherehe_db::models::status::MessageStatus;
use sherehe_db::repositories::message_repo::StatusUpdateOutcome;
use sherehe_db::repositories::{ConversationRepo, MessageRepo};

// ---------------------------------------------------------------------------
// Test: a late `delivered` after `read` is ignored
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn late_delivered_update_never_regresses_a_read_message(pool: PgPool) {
    let conversation = ConversationRepo::upsert(&pool, "255712345678", Some("Amina"))
        .await
        .unwrap();
    MessageRepo::insert_outbound(
        &pool,
        conversation.id,
        "wamid.ORDER1",
        "template",
        "Habari Amina, karibu!",
    )
    .await
    .unwrap();

    let outcome =
        MessageRepo::update_status(&pool, "wamid.ORDER1", MessageStatus::Read, None, None)
            .await
            .unwrap();
    assert!(matches!(outcome, StatusUpdateOutcome::Updated(_)));

    // The delivery receipt arrives after the read receipt.
    let outcome =
        MessageRepo::update_status(&pool, "wamid.ORDER1", MessageStatus::Delivered, None, None)
            .await
            .unwrap();
    assert!(matches!(outcome, StatusUpdateOutcome::Ignored));

    let messages = MessageRepo::list_by_conversation(&pool, conversation.id, None, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].status_id, MessageStatus::Read.id());
    assert!(messages[0].delivered_at.is_none());
    assert!(messages[0].read_at.is_some());
}

// ---------------------------------------------------------------------------
// Test: a status for an unknown provider id is reported as such
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn status_for_an_unknown_provider_id_is_flagged(pool: PgPool) {
    let outcome =
        MessageRepo::update_status(&pool, "wamid.NOSUCH", MessageStatus::Delivered, None, None)
            .await
            .unwrap();
    assert!(matches!(outcome, StatusUpdateOutcome::Unknown));
}
