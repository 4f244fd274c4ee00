//! Integration tests for the encrypted Flow endpoint.
//!
//! All cases here avoid the database: the ping action and the two
//! rejection paths (bad signature, undecryptable envelope) never touch
//! a repository.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sherehe_whatsapp::flow::FlowRequest;
use tower::ServiceExt;

const SESSION_KEY: [u8; 16] = [7u8; 16];
const SESSION_IV: [u8; 12] = [3u8; 12];

fn ping_request() -> FlowRequest {
    FlowRequest {
        version: Some("3.0".into()),
        action: "ping".into(),
        screen: None,
        data: None,
        flow_token: None,
    }
}

async fn post_flow(app: axum::Router, signature: &str, body: Vec<u8>) -> axum::http::Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/flow")
            .header("content-type", "application/json")
            .header("x-hub-signature-256", signature)
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn ping_roundtrips_through_the_codec() {
    let app = common::build_test_app();
    let codec = common::test_codec();

    let envelope = codec
        .seal(&ping_request(), &SESSION_KEY, &SESSION_IV)
        .unwrap();
    let body = serde_json::to_vec(&envelope).unwrap();
    let signature = codec.sign(&body);

    let response = post_flow(app, &signature, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/plain")
    );

    // Decrypt the response with the session material we chose.
    let (_, session) = codec.decrypt(&envelope).unwrap();
    let encrypted = response.into_body().collect().await.unwrap().to_bytes();
    let reply = codec
        .open_response(&session, std::str::from_utf8(&encrypted).unwrap())
        .unwrap();

    assert_eq!(reply["data"]["status"], "active");
}

#[tokio::test]
async fn tampered_signature_is_rejected_with_432() {
    let app = common::build_test_app();
    let codec = common::test_codec();

    let envelope = codec
        .seal(&ping_request(), &SESSION_KEY, &SESSION_IV)
        .unwrap();
    let body = serde_json::to_vec(&envelope).unwrap();

    let response = post_flow(app, "sha256=deadbeef", body).await;
    assert_eq!(response.status().as_u16(), 432);
}

#[tokio::test]
async fn missing_signature_header_is_rejected_with_432() {
    let app = common::build_test_app();
    let codec = common::test_codec();

    let envelope = codec
        .seal(&ping_request(), &SESSION_KEY, &SESSION_IV)
        .unwrap();
    let body = serde_json::to_vec(&envelope).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/flow")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 432);
}

#[tokio::test]
async fn well_signed_garbage_is_rejected_with_421() {
    let app = common::build_test_app();
    let codec = common::test_codec();

    // Valid signature over a body that is not a decryptable envelope.
    let body = br#"{"encrypted_flow_data":"AAAA","encrypted_aes_key":"AAAA","initial_vector":"AAAA"}"#.to_vec();
    let signature = codec.sign(&body);

    let response = post_flow(app, &signature, body).await;
    assert_eq!(response.status().as_u16(), 421);
}

#[tokio::test]
async fn signed_non_envelope_body_is_rejected_with_421() {
    let app = common::build_test_app();
    let codec = common::test_codec();

    let body = br#"{"hello":"world"}"#.to_vec();
    let signature = codec.sign(&body);

    let response = post_flow(app, &signature, body).await;
    assert_eq!(response.status().as_u16(), 421);
}
