//! Typed webhook payloads.
//!
//! The provider delivers loosely-shaped JSON; everything here is parsed
//! into a tagged union up front -- top-level envelope, then message
//! sub-type, then status sub-type -- so downstream routing never touches
//! raw `serde_json::Value`s. Absent arrays deserialize to `None` and are
//! not errors.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::client::WINDOW_EXPIRED_CODE;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Top-level webhook body: `{object, entry: [{changes: [...]}]}`.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub field: String,
    pub value: ChangeValue,
}

/// The interesting part of a change: any combination of contacts,
/// inbound messages, and delivery statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    pub contacts: Option<Vec<Contact>>,
    pub messages: Option<Vec<InboundMessage>>,
    pub statuses: Option<Vec<StatusUpdate>>,
}

impl ChangeValue {
    /// Build the wa_id → profile-name lookup used to label
    /// conversations.
    pub fn contact_names(&self) -> HashMap<String, String> {
        self.contacts
            .iter()
            .flatten()
            .filter_map(|contact| {
                let name = contact.profile.as_ref()?.name.clone()?;
                Some((contact.wa_id.clone(), name))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct Contact {
    pub wa_id: String,
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// One inbound message; the payload body is discriminated by the wire
/// `type` field.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    /// Sender phone in provider form (digits, no `+`).
    pub from: String,
    /// Provider message id.
    pub id: String,
    /// Epoch-seconds string.
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub body: InboundBody,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundBody {
    Text {
        text: TextBody,
    },
    /// Quick-reply button tap on a template message.
    Button {
        button: ButtonReply,
    },
    /// Interactive reply: Flow completion (`nfm_reply`) or an
    /// interactive-list/button selection.
    Interactive {
        interactive: Interactive,
    },
    /// Any message type this pipeline does not handle (media, location,
    /// stickers, ...). Stored as an opaque placeholder.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ButtonReply {
    /// Button label as shown to the guest.
    pub text: Option<String>,
    /// Developer-defined payload.
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Interactive {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Present when the guest submitted a Flow.
    pub nfm_reply: Option<NfmReply>,
    /// Present for interactive button replies.
    pub button_reply: Option<InteractiveButtonReply>,
}

#[derive(Debug, Deserialize)]
pub struct NfmReply {
    /// JSON-encoded Flow response body.
    pub response_json: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InteractiveButtonReply {
    pub id: Option<String>,
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Delivery statuses
// ---------------------------------------------------------------------------

/// A delivery-lifecycle update for one previously sent message.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// Provider message id the status refers to.
    pub id: String,
    /// Wire status: `sent` | `delivered` | `read` | `failed`.
    pub status: String,
    /// Epoch-seconds string.
    pub timestamp: Option<String>,
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<StatusError>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusError {
    pub code: i64,
    pub title: Option<String>,
    pub message: Option<String>,
    pub error_data: Option<StatusErrorData>,
}

#[derive(Debug, Deserialize)]
pub struct StatusErrorData {
    pub details: Option<String>,
}

impl StatusUpdate {
    /// Whether any attached error is the provider's session-window
    /// code.
    pub fn is_window_expired(&self) -> bool {
        self.errors
            .iter()
            .flatten()
            .any(|error| error.code == WINDOW_EXPIRED_CODE)
    }

    /// The most specific error text available, preferring nested
    /// details over title/message.
    pub fn error_detail(&self) -> Option<String> {
        let error = self.errors.iter().flatten().next()?;
        error
            .error_data
            .as_ref()
            .and_then(|data| data.details.clone())
            .or_else(|| error.message.clone())
            .or_else(|| error.title.clone())
            .or_else(|| Some(format!("provider error {}", error.code)))
    }

    /// Parse the epoch-seconds timestamp when present and valid.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let seconds: i64 = self.timestamp.as_deref()?.parse().ok()?;
        Utc.timestamp_opt(seconds, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_message_with_contact() {
        let value: ChangeValue = serde_json::from_value(serde_json::json!({
            "contacts": [{"wa_id": "255712345678", "profile": {"name": "Amina"}}],
            "messages": [{
                "from": "255712345678",
                "id": "wamid.abc",
                "timestamp": "1700000000",
                "type": "text",
                "text": {"body": "ndiyo"}
            }]
        }))
        .unwrap();

        let names = value.contact_names();
        assert_eq!(names.get("255712345678").map(String::as_str), Some("Amina"));

        let messages = value.messages.unwrap();
        match &messages[0].body {
            InboundBody::Text { text } => assert_eq!(text.body, "ndiyo"),
            other => panic!("expected text body, got {other:?}"),
        }
    }

    #[test]
    fn parses_button_reply() {
        let message: InboundMessage = serde_json::from_value(serde_json::json!({
            "from": "255712345678",
            "id": "wamid.btn",
            "type": "button",
            "button": {"text": "Yes", "payload": "rsvp_accept"}
        }))
        .unwrap();

        match &message.body {
            InboundBody::Button { button } => {
                assert_eq!(button.text.as_deref(), Some("Yes"));
                assert_eq!(button.payload.as_deref(), Some("rsvp_accept"));
            }
            other => panic!("expected button body, got {other:?}"),
        }
    }

    #[test]
    fn parses_flow_reply() {
        let message: InboundMessage = serde_json::from_value(serde_json::json!({
            "from": "255712345678",
            "id": "wamid.flow",
            "type": "interactive",
            "interactive": {
                "type": "nfm_reply",
                "nfm_reply": {
                    "response_json": "{\"attendance_response\":\"accept\"}",
                    "name": "flow"
                }
            }
        }))
        .unwrap();

        match &message.body {
            InboundBody::Interactive { interactive } => {
                let reply = interactive.nfm_reply.as_ref().unwrap();
                assert!(reply.response_json.contains("attendance_response"));
            }
            other => panic!("expected interactive body, got {other:?}"),
        }
    }

    #[test]
    fn unknown_message_type_is_unsupported_not_an_error() {
        let message: InboundMessage = serde_json::from_value(serde_json::json!({
            "from": "255712345678",
            "id": "wamid.img",
            "type": "image",
            "image": {"id": "media-1"}
        }))
        .unwrap();

        assert!(matches!(message.body, InboundBody::Unsupported));
    }

    #[test]
    fn missing_messages_and_statuses_are_tolerated() {
        let value: ChangeValue = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(value.contacts.is_none());
        assert!(value.messages.is_none());
        assert!(value.statuses.is_none());
        assert!(value.contact_names().is_empty());
    }

    #[test]
    fn status_error_detail_prefers_nested_details() {
        let status: StatusUpdate = serde_json::from_value(serde_json::json!({
            "id": "wamid.x",
            "status": "failed",
            "errors": [{
                "code": 131026,
                "title": "Undeliverable",
                "message": "Message undeliverable",
                "error_data": {"details": "Recipient opted out"}
            }]
        }))
        .unwrap();

        assert_eq!(status.error_detail().as_deref(), Some("Recipient opted out"));
        assert!(!status.is_window_expired());
    }

    #[test]
    fn window_expired_code_is_detected() {
        let status: StatusUpdate = serde_json::from_value(serde_json::json!({
            "id": "wamid.x",
            "status": "failed",
            "errors": [{"code": 131047}]
        }))
        .unwrap();

        assert!(status.is_window_expired());
        assert_eq!(
            status.error_detail().as_deref(),
            Some("provider error 131047")
        );
    }

    #[test]
    fn timestamp_parses_epoch_seconds() {
        let status: StatusUpdate = serde_json::from_value(serde_json::json!({
            "id": "wamid.x",
            "status": "delivered",
            "timestamp": "1700000000"
        }))
        .unwrap();

        let parsed = status.parsed_timestamp().unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
    }
}
