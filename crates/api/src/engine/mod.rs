//! The messaging engine: everything between the HTTP surface and the
//! repositories.
//!
//! - [`inbound`] routes one webhook change value to the right handler.
//! - [`rsvp`] resolves attendance decisions from buttons and Flows.
//! - [`campaign`] runs the sequential, rate-limited send loop.
//! - [`import`] parses recipient spreadsheets with row-level errors.

pub mod campaign;
pub mod import;
pub mod inbound;
pub mod rsvp;
