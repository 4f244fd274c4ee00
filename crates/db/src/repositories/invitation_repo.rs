//! Repository for the `invitations` table.
//!
//! RSVP state machine rules live in [`InvitationRepo::set_rsvp`]'s
//! conditional UPDATE: the transition (and its `rsvp_at` stamp) only
//! applies when the status actually changes, so a guest repeating a
//! decision never refreshes the timestamp.

use sqlx::PgPool;
use sherehe_core::types::DbId;

use crate::models::invitation::Invitation;
use crate::models::status::RsvpStatus;

/// Column list for `invitations` queries.
const COLUMNS: &str = "\
    id, event_id, guest_name, phone, rsvp_status_id, rsvp_at, rsvp_notes, \
    created_at, updated_at";

/// Outcome of an RSVP transition attempt.
#[derive(Debug)]
pub enum SetRsvpOutcome {
    /// The status changed; `rsvp_at` was stamped.
    Updated(Invitation),
    /// The invitation was already in the requested status; nothing
    /// was written.
    Unchanged(Invitation),
}

pub struct InvitationRepo;

impl InvitationRepo {
    /// Create a guest invitation in the initial pending state.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        guest_name: &str,
        phone: &str,
    ) -> Result<Invitation, sqlx::Error> {
        let query = format!(
            "INSERT INTO invitations (event_id, guest_name, phone, rsvp_status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(event_id)
            .bind(guest_name)
            .bind(phone)
            .bind(RsvpStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find an invitation by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Invitation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invitations WHERE id = $1");
        sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a set of invitations by id, preserving no particular order.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<Invitation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invitations WHERE id = ANY($1)");
        sqlx::query_as::<_, Invitation>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// The most recent invitation addressed to a phone number.
    ///
    /// Quick-reply buttons carry no invitation reference, only the
    /// sender's phone; the newest invitation is the one the guest is
    /// answering.
    pub async fn find_latest_by_phone(
        pool: &PgPool,
        phone: &str,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invitations \
             WHERE phone = $1 ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Invitations for one event, insertion order.
    pub async fn list_by_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<Invitation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invitations WHERE event_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Apply an attendance decision.
    ///
    /// Accepted and declined are reachable from pending and from each
    /// other; pending is initial-only and is never a transition target
    /// here. Returns [`SetRsvpOutcome::Unchanged`] without touching
    /// `rsvp_at` when the invitation already holds the requested
    /// status; notes passed with a repeated decision are still
    /// recorded.
    pub async fn set_rsvp(
        pool: &PgPool,
        id: DbId,
        status: RsvpStatus,
        notes: Option<&str>,
    ) -> Result<Option<SetRsvpOutcome>, sqlx::Error> {
        debug_assert_ne!(status, RsvpStatus::Pending, "pending is initial-only");

        let query = format!(
            "UPDATE invitations \
             SET rsvp_status_id = $2, rsvp_at = NOW(), \
                 rsvp_notes = COALESCE($3, rsvp_notes), updated_at = NOW() \
             WHERE id = $1 AND rsvp_status_id <> $2 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .bind(status.id())
            .bind(notes)
            .fetch_optional(pool)
            .await?;

        if let Some(invitation) = updated {
            return Ok(Some(SetRsvpOutcome::Updated(invitation)));
        }

        // Either the invitation does not exist or it already holds the
        // requested status. A repeated decision can still carry fresh
        // notes; record those without touching `rsvp_at`.
        if let Some(new_notes) = notes {
            let query = format!(
                "UPDATE invitations \
                 SET rsvp_notes = $2, updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING {COLUMNS}"
            );
            return Ok(sqlx::query_as::<_, Invitation>(&query)
                .bind(id)
                .bind(new_notes)
                .fetch_optional(pool)
                .await?
                .map(SetRsvpOutcome::Unchanged));
        }

        match Self::find_by_id(pool, id).await? {
            Some(existing) => Ok(Some(SetRsvpOutcome::Unchanged(existing))),
            None => Ok(None),
        }
    }
}
