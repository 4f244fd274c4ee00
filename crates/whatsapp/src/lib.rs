//! WhatsApp Business Cloud API integration.
//!
//! Four concerns, each in its own module:
//!
//! - [`client`] -- authenticated outbound calls (text/template/image
//!   sends, media upload) with nested provider-error extraction.
//! - [`webhook`] -- typed payloads for inbound webhook events, parsed
//!   as tagged unions with every optional field guarded.
//! - [`template`] -- human-readable preview rendering of template
//!   components for storage and UI.
//! - [`flow`] -- the signed, encrypted request/response codec for
//!   interactive Flow exchanges.

pub mod client;
pub mod flow;
pub mod template;
pub mod webhook;
