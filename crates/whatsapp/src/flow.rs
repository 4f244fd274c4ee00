//! Encrypted Flow exchange codec.
//!
//! Flow endpoints receive a signed envelope carrying a wrapped session
//! key, an IV, and an AES-128-GCM payload. The codec verifies the
//! request signature, unwraps the session key, decrypts the payload,
//! and encrypts responses under the same session key with a
//! bitwise-inverted IV so request and response never share a nonce.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";
const SESSION_KEY_LEN: usize = 16;
const IV_LEN: usize = 12;

/// Wire shape of an encrypted Flow request body. All three fields are
/// base64.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlowEnvelope {
    pub encrypted_flow_data: String,
    pub encrypted_aes_key: String,
    pub initial_vector: String,
}

/// Decrypted Flow request payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlowRequest {
    pub version: Option<String>,
    pub action: String,
    pub screen: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub flow_token: Option<String>,
}

/// Session material recovered from one envelope; needed again to
/// encrypt the response.
#[derive(Debug, Clone)]
pub struct FlowSession {
    key: [u8; SESSION_KEY_LEN],
    iv: [u8; IV_LEN],
}

#[derive(Debug, thiserror::Error)]
pub enum FlowCodecError {
    /// Request signature missing or wrong. Answered with HTTP 432 so
    /// the provider retries with fresh material.
    #[error("flow request signature invalid")]
    SignatureInvalid,
    /// Envelope fields missing, not base64, or of the wrong length.
    /// Answered with HTTP 421.
    #[error("flow envelope malformed: {0}")]
    Envelope(&'static str),
    /// Key unwrap or payload decrypt failed. Answered with HTTP 421.
    #[error("flow payload decryption failed")]
    Decrypt,
    #[error("flow response encryption failed")]
    Encrypt,
    #[error("flow payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Verifies signatures with the app secret and unwraps session keys
/// with a key derived from the endpoint secret.
#[derive(Clone)]
pub struct FlowCodec {
    app_secret: String,
    endpoint_key: [u8; 32],
}

impl FlowCodec {
    pub fn new(app_secret: impl Into<String>, endpoint_secret: &str) -> Self {
        let digest = Sha256::digest(endpoint_secret.as_bytes());
        let mut endpoint_key = [0u8; 32];
        endpoint_key.copy_from_slice(&digest);
        Self {
            app_secret: app_secret.into(),
            endpoint_key,
        }
    }

    /// Check the `X-Hub-Signature-256` header against the raw request
    /// body. The header carries `sha256=<hex hmac>`.
    pub fn verify(&self, signature_header: &str, body: &[u8]) -> Result<(), FlowCodecError> {
        let hex_digest = signature_header
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(FlowCodecError::SignatureInvalid)?;
        let expected = decode_hex(hex_digest).ok_or(FlowCodecError::SignatureInvalid)?;

        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.app_secret.as_bytes())
            .map_err(|_| FlowCodecError::SignatureInvalid)?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| FlowCodecError::SignatureInvalid)
    }

    /// Sign a raw body the way the provider does. Used by callers that
    /// need to produce outbound signatures.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.app_secret.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(body);
        format!("{SIGNATURE_PREFIX}{}", encode_hex(&mac.finalize().into_bytes()))
    }

    /// Unwrap the session key and decrypt the request payload.
    pub fn decrypt(
        &self,
        envelope: &FlowEnvelope,
    ) -> Result<(FlowRequest, FlowSession), FlowCodecError> {
        let iv_bytes = BASE64
            .decode(&envelope.initial_vector)
            .map_err(|_| FlowCodecError::Envelope("initial_vector is not base64"))?;
        let iv: [u8; IV_LEN] = iv_bytes
            .try_into()
            .map_err(|_| FlowCodecError::Envelope("initial_vector must be 12 bytes"))?;

        let wrapped_key = BASE64
            .decode(&envelope.encrypted_aes_key)
            .map_err(|_| FlowCodecError::Envelope("encrypted_aes_key is not base64"))?;
        let ciphertext = BASE64
            .decode(&envelope.encrypted_flow_data)
            .map_err(|_| FlowCodecError::Envelope("encrypted_flow_data is not base64"))?;

        let kek = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.endpoint_key));
        let key_bytes = kek
            .decrypt(Nonce::from_slice(&iv), wrapped_key.as_ref())
            .map_err(|_| FlowCodecError::Decrypt)?;
        let key: [u8; SESSION_KEY_LEN] = key_bytes
            .try_into()
            .map_err(|_| FlowCodecError::Envelope("session key must be 16 bytes"))?;

        let session = FlowSession { key, iv };
        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&session.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&session.iv), ciphertext.as_ref())
            .map_err(|_| FlowCodecError::Decrypt)?;

        let request: FlowRequest = serde_json::from_slice(&plaintext)?;
        Ok((request, session))
    }

    /// Encrypt a response payload under the request's session key with
    /// the inverted IV. Returns the base64 body sent as `text/plain`.
    pub fn encrypt_response(
        &self,
        session: &FlowSession,
        payload: &serde_json::Value,
    ) -> Result<String, FlowCodecError> {
        let plaintext = serde_json::to_vec(payload)?;
        let response_iv = invert_iv(&session.iv);

        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&session.key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&response_iv), plaintext.as_ref())
            .map_err(|_| FlowCodecError::Encrypt)?;
        Ok(BASE64.encode(ciphertext))
    }

    /// Build an envelope from plaintext with caller-chosen session
    /// material. The inverse of [`FlowCodec::decrypt`]; used by tests
    /// and local tooling.
    pub fn seal(
        &self,
        request: &FlowRequest,
        key: &[u8; SESSION_KEY_LEN],
        iv: &[u8; IV_LEN],
    ) -> Result<FlowEnvelope, FlowCodecError> {
        let plaintext = serde_json::to_vec(request)?;

        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(iv), plaintext.as_ref())
            .map_err(|_| FlowCodecError::Encrypt)?;

        let kek = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.endpoint_key));
        let wrapped_key = kek
            .encrypt(Nonce::from_slice(iv), key.as_ref())
            .map_err(|_| FlowCodecError::Encrypt)?;

        Ok(FlowEnvelope {
            encrypted_flow_data: BASE64.encode(ciphertext),
            encrypted_aes_key: BASE64.encode(wrapped_key),
            initial_vector: BASE64.encode(iv),
        })
    }

    /// Decrypt a base64 response body. Only tests need this direction.
    pub fn open_response(
        &self,
        session: &FlowSession,
        body: &str,
    ) -> Result<serde_json::Value, FlowCodecError> {
        let ciphertext = BASE64
            .decode(body)
            .map_err(|_| FlowCodecError::Envelope("response body is not base64"))?;
        let response_iv = invert_iv(&session.iv);

        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&session.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&response_iv), ciphertext.as_ref())
            .map_err(|_| FlowCodecError::Decrypt)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

fn invert_iv(iv: &[u8; IV_LEN]) -> [u8; IV_LEN] {
    let mut inverted = [0u8; IV_LEN];
    for (out, byte) in inverted.iter_mut().zip(iv) {
        *out = !byte;
    }
    inverted
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }
    (0..input.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&input[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> FlowCodec {
        FlowCodec::new("app-secret", "endpoint-secret")
    }

    fn sample_request() -> FlowRequest {
        FlowRequest {
            version: Some("3.0".into()),
            action: "data_exchange".into(),
            screen: Some("RSVP".into()),
            data: Some(serde_json::json!({"attendance_response": "accept"})),
            flow_token: Some("42_7".into()),
        }
    }

    #[test]
    fn signature_roundtrip() {
        let codec = codec();
        let body = br#"{"encrypted_flow_data":"..."}"#;
        let signature = codec.sign(body);
        assert!(signature.starts_with("sha256="));
        codec.verify(&signature, body).unwrap();
    }

    #[test]
    fn tampered_body_fails_verification() {
        let codec = codec();
        let signature = codec.sign(b"original");
        assert!(matches!(
            codec.verify(&signature, b"tampered"),
            Err(FlowCodecError::SignatureInvalid)
        ));
    }

    #[test]
    fn signature_without_prefix_is_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.verify("deadbeef", b"body"),
            Err(FlowCodecError::SignatureInvalid)
        ));
    }

    #[test]
    fn envelope_roundtrip() {
        let codec = codec();
        let key = [7u8; SESSION_KEY_LEN];
        let iv = [3u8; IV_LEN];

        let envelope = codec.seal(&sample_request(), &key, &iv).unwrap();
        let (request, session) = codec.decrypt(&envelope).unwrap();

        assert_eq!(request.action, "data_exchange");
        assert_eq!(request.screen.as_deref(), Some("RSVP"));
        assert_eq!(request.flow_token.as_deref(), Some("42_7"));

        let response = serde_json::json!({"screen": "SUCCESS", "data": {}});
        let body = codec.encrypt_response(&session, &response).unwrap();
        let opened = codec.open_response(&session, &body).unwrap();
        assert_eq!(opened, response);
    }

    #[test]
    fn response_iv_differs_from_request_iv() {
        let iv = [0x0fu8; IV_LEN];
        assert_eq!(invert_iv(&iv), [0xf0u8; IV_LEN]);
    }

    #[test]
    fn wrong_endpoint_secret_cannot_decrypt() {
        let codec = codec();
        let envelope = codec
            .seal(&sample_request(), &[7u8; SESSION_KEY_LEN], &[3u8; IV_LEN])
            .unwrap();

        let other = FlowCodec::new("app-secret", "different-secret");
        assert!(matches!(other.decrypt(&envelope), Err(FlowCodecError::Decrypt)));
    }

    #[test]
    fn truncated_iv_is_an_envelope_error() {
        let codec = codec();
        let mut envelope = codec
            .seal(&sample_request(), &[7u8; SESSION_KEY_LEN], &[3u8; IV_LEN])
            .unwrap();
        envelope.initial_vector = BASE64.encode([3u8; 4]);
        assert!(matches!(
            codec.decrypt(&envelope),
            Err(FlowCodecError::Envelope(_))
        ));
    }
}
