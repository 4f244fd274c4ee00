//! Authenticated HTTP client for the WhatsApp Business Cloud API.
//!
//! One [`WhatsAppClient`] is constructed at startup and shared through
//! application state; it is never reached through ambient globals.
//! Graph API failures are decoded into [`WhatsAppError::Api`] with the
//! nested error code/message/detail extracted when present; the
//! provider's session-window code gets its own variant so callers can
//! steer the conversation toward templates.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::template::Component;

/// HTTP request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider error code for a lapsed 24-hour customer session window
/// (re-engagement required).
pub const WINDOW_EXPIRED_CODE: i64 = 131047;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from outbound provider calls.
#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    /// The underlying HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Graph API returned a structured error payload.
    #[error("Provider error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        detail: Option<String>,
    },

    /// The 24-hour session window has lapsed; only template messages
    /// may be sent until the customer writes again.
    #[error("Session window expired (provider code {WINDOW_EXPIRED_CODE})")]
    WindowExpired,

    /// A 2xx response that does not carry the expected fields.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl WhatsAppError {
    /// The most specific human-readable detail available, preferring
    /// the provider's nested `error_data.details` over the top-level
    /// message. Used verbatim as per-recipient failure text.
    pub fn detail_message(&self) -> String {
        match self {
            WhatsAppError::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config & client
// ---------------------------------------------------------------------------

/// Connection settings for one WhatsApp Business phone number.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Graph API base, e.g. `https://graph.facebook.com/v20.0`.
    pub api_url: String,
    /// Bearer token for the business account.
    pub access_token: String,
    /// Sender phone-number id assigned by the provider.
    pub phone_number_id: String,
}

/// Receipt for an accepted outbound message.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// Provider message id (`wamid....`), later matched by status
    /// webhooks.
    pub message_id: String,
}

/// Client for the WhatsApp Business Cloud API.
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    /// Build a client with a pre-configured HTTP connection pool.
    pub fn new(config: WhatsAppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { http, config }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_url, self.config.phone_number_id
        )
    }

    /// Send a free-form text message (requires an open session window).
    pub async fn send_text(&self, to: &str, body: &str) -> Result<SendReceipt, WhatsAppError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });
        self.post_message(&payload).await
    }

    /// Send a pre-approved template message.
    pub async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        language: &str,
        components: &[Component],
    ) -> Result<SendReceipt, WhatsAppError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": template_name,
                "language": { "code": language },
                "components": components,
            },
        });
        self.post_message(&payload).await
    }

    /// Send a hosted image with an optional caption.
    pub async fn send_image(
        &self,
        to: &str,
        link: &str,
        caption: Option<&str>,
    ) -> Result<SendReceipt, WhatsAppError> {
        let mut image = json!({ "link": link });
        if let Some(caption) = caption {
            image["caption"] = json!(caption);
        }
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "image",
            "image": image,
        });
        self.post_message(&payload).await
    }

    /// Upload media bytes; returns the provider media id for reuse in
    /// subsequent sends.
    pub async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<String, WhatsAppError> {
        let url = format!(
            "{}/{}/media",
            self.config.api_url, self.config.phone_number_id
        );

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .part("file", part);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await?;

        let body = Self::check(response).await?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WhatsAppError::MalformedResponse("media upload: missing id".into()))
    }

    /// POST a message payload and extract the provider message id.
    async fn post_message(
        &self,
        payload: &serde_json::Value,
    ) -> Result<SendReceipt, WhatsAppError> {
        let response = self
            .http
            .post(self.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(payload)
            .send()
            .await?;

        let body = Self::check(response).await?;
        tracing::debug!(
            kind = payload["type"].as_str().unwrap_or("unknown"),
            "Provider accepted outbound message"
        );
        let message_id = body["messages"][0]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                WhatsAppError::MalformedResponse("send: missing messages[0].id".into())
            })?;

        Ok(SendReceipt { message_id })
    }

    /// Turn a non-2xx response into the structured provider error.
    async fn check(response: reqwest::Response) -> Result<serde_json::Value, WhatsAppError> {
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if status.is_success() {
            return Ok(body);
        }

        match serde_json::from_value::<GraphErrorEnvelope>(body.clone()) {
            Ok(envelope) => {
                let error = envelope.error;
                if error.code == WINDOW_EXPIRED_CODE {
                    return Err(WhatsAppError::WindowExpired);
                }
                Err(WhatsAppError::Api {
                    code: error.code,
                    message: error.message,
                    detail: error.error_data.and_then(|d| d.details),
                })
            }
            Err(_) => Err(WhatsAppError::Api {
                code: status.as_u16() as i64,
                message: format!("HTTP {status}"),
                detail: None,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Graph error payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    code: i64,
    #[serde(default)]
    message: String,
    error_data: Option<GraphErrorData>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorData {
    details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(body: serde_json::Value) -> WhatsAppError {
        let envelope: GraphErrorEnvelope = serde_json::from_value(body).unwrap();
        let error = envelope.error;
        if error.code == WINDOW_EXPIRED_CODE {
            return WhatsAppError::WindowExpired;
        }
        WhatsAppError::Api {
            code: error.code,
            message: error.message,
            detail: error.error_data.and_then(|d| d.details),
        }
    }

    #[test]
    fn nested_detail_is_extracted() {
        let error = parse_error(serde_json::json!({
            "error": {
                "code": 131026,
                "message": "Message undeliverable",
                "error_data": { "details": "Recipient is not a valid WhatsApp user" }
            }
        }));
        assert_eq!(
            error.detail_message(),
            "Recipient is not a valid WhatsApp user"
        );
    }

    #[test]
    fn missing_detail_falls_back_to_message() {
        let error = parse_error(serde_json::json!({
            "error": { "code": 100, "message": "Invalid parameter" }
        }));
        assert_eq!(error.detail_message(), "Provider error 100: Invalid parameter");
    }

    #[test]
    fn window_expired_code_maps_to_dedicated_variant() {
        let error = parse_error(serde_json::json!({
            "error": { "code": 131047, "message": "Re-engagement message" }
        }));
        assert!(matches!(error, WhatsAppError::WindowExpired));
    }

    #[test]
    fn client_constructs_urls_from_config() {
        let client = WhatsAppClient::new(WhatsAppConfig {
            api_url: "https://graph.example.com/v20.0".into(),
            access_token: "token".into(),
            phone_number_id: "123456".into(),
        });
        assert_eq!(
            client.messages_url(),
            "https://graph.example.com/v20.0/123456/messages"
        );
    }
}
