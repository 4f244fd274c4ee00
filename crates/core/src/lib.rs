//! Pure domain logic for the Sherehe platform.
//!
//! Everything in this crate is side-effect free: phone number
//! canonicalization, RSVP keyword matching and localized reply texts,
//! media kind inference, and the shared domain error type. Persistence
//! and provider I/O live in `sherehe_db` and `sherehe_whatsapp`.

pub mod error;
pub mod media;
pub mod phone;
pub mod rsvp;
pub mod types;
