//! Integration tests for the RSVP state machine against a real
//! database.

use sqlx::PgPool;

use sherehe_db::models::status::RsvpStatus;
use sherehe_db::repositories::invitation_repo::SetRsvpOutcome;
use sherehe_db::repositories::InvitationRepo;

// ---------------------------------------------------------------------------
// Test: repeating a decision keeps the timestamp but records new notes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn repeated_decision_records_new_notes_without_restamping(pool: PgPool) {
    let invitation = InvitationRepo::create(&pool, 1, "Amina", "255712345678")
        .await
        .unwrap();

    let outcome = InvitationRepo::set_rsvp(
        &pool,
        invitation.id,
        RsvpStatus::Accepted,
        Some("tutakuja wawili"),
    )
    .await
    .unwrap()
    .unwrap();
    let first = match outcome {
        SetRsvpOutcome::Updated(inv) => inv,
        SetRsvpOutcome::Unchanged(_) => panic!("first decision must apply"),
    };
    let first_stamp = first.rsvp_at.expect("decision stamps rsvp_at");

    // The guest confirms again with different free-text notes.
    let outcome = InvitationRepo::set_rsvp(
        &pool,
        invitation.id,
        RsvpStatus::Accepted,
        Some("tutakuja watatu"),
    )
    .await
    .unwrap()
    .unwrap();
    let repeated = match outcome {
        SetRsvpOutcome::Unchanged(inv) => inv,
        SetRsvpOutcome::Updated(_) => panic!("repeated decision must not transition"),
    };

    assert_eq!(repeated.rsvp_notes.as_deref(), Some("tutakuja watatu"));
    assert_eq!(repeated.rsvp_at, Some(first_stamp));
}

// ---------------------------------------------------------------------------
// Test: a repeat without notes leaves the earlier notes in place
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn repeated_decision_without_notes_keeps_earlier_notes(pool: PgPool) {
    let invitation = InvitationRepo::create(&pool, 1, "Juma", "255765432109")
        .await
        .unwrap();

    InvitationRepo::set_rsvp(&pool, invitation.id, RsvpStatus::Declined, Some("safarini"))
        .await
        .unwrap()
        .unwrap();

    let outcome = InvitationRepo::set_rsvp(&pool, invitation.id, RsvpStatus::Declined, None)
        .await
        .unwrap()
        .unwrap();
    let repeated = match outcome {
        SetRsvpOutcome::Unchanged(inv) => inv,
        SetRsvpOutcome::Updated(_) => panic!("repeated decision must not transition"),
    };
    assert_eq!(repeated.rsvp_notes.as_deref(), Some("safarini"));
}
