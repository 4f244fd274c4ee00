//! In-process event distribution for the Sherehe platform.
//!
//! Handlers and background tasks publish [`PlatformEvent`]s on the
//! shared [`EventBus`]; the real-time push transport subscribes and
//! forwards them to connected admin clients. Only the emitted events
//! are defined here -- the transport itself is an external collaborator.

pub mod bus;

pub use bus::{EventBus, PlatformEvent};
