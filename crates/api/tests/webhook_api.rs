//! Integration tests for the provider-facing webhook endpoints and
//! general HTTP behaviour (routing, request ids).

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Verification handshake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn handshake_with_matching_token_echoes_challenge() {
    let app = common::build_test_app();
    let uri = format!(
        "/webhook?hub.mode=subscribe&hub.verify_token={}&hub.challenge=challenge-4711",
        common::TEST_VERIFY_TOKEN
    );

    let response = common::get(app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "challenge-4711");
}

#[tokio::test]
async fn handshake_with_wrong_token_is_forbidden_and_empty() {
    let app = common::build_test_app();
    let uri = "/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=x";

    let response = common::get(app, uri).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::body_string(response).await, "");
}

#[tokio::test]
async fn handshake_without_subscribe_mode_is_forbidden() {
    let app = common::build_test_app();
    let uri = format!(
        "/webhook?hub.mode=unsubscribe&hub.verify_token={}&hub.challenge=x",
        common::TEST_VERIFY_TOKEN
    );

    let response = common::get(app, &uri).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Event delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_post_acknowledges_before_processing() {
    let app = common::build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"object":"whatsapp_business_account","entry":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unparseable_event_payload_is_still_acknowledged() {
    let app = common::build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .body(Body::from("not json at all"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// General HTTP behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app();
    let response = common::get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = common::build_test_app();
    let uri = "/webhook?hub.mode=subscribe&hub.verify_token=wrong";
    let response = common::get(app, uri).await;

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );
}
