//! Integration tests for the campaign lifecycle against a real database.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use common::{body_json, expect_json};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use sherehe_db::models::status::{CampaignStatus, RecipientStatus};
use sherehe_db::repositories::{CampaignRepo, RecipientRepo};

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn create_campaign(app: &Router) -> i64 {
    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/v1/campaigns",
        json!({
            "name": "Harusi ya Amina",
            "template_name": "wedding_invite",
            "template_language": "sw",
            "template_body": "Habari {{1}}, karibu!",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

async fn add_recipient(app: &Router, campaign_id: i64, phone: &str) -> Response<Body> {
    send_json(
        app.clone(),
        Method::POST,
        &format!("/api/v1/campaigns/{campaign_id}/recipients"),
        json!({ "phone": phone, "name": "Amina" }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Test: editing a finished campaign resets it to a re-sendable draft
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn editing_a_finished_campaign_resets_it_to_draft(pool: PgPool) {
    let app = common::build_test_app_with_pool(pool.clone());
    let id = create_campaign(&app).await;

    let response = add_recipient(&app, id, "0712345678").await;
    let recipient_id = expect_json(response, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap();

    // Walk the campaign through a run that ends in failure.
    assert!(CampaignRepo::begin_sending(&pool, id, 1).await.unwrap());
    RecipientRepo::mark_failed(&pool, recipient_id, "provider rejected")
        .await
        .unwrap();
    CampaignRepo::increment_failed(&pool, id).await.unwrap();
    CampaignRepo::finish(&pool, id, CampaignStatus::Failed)
        .await
        .unwrap();

    let response = send_json(
        app.clone(),
        Method::PUT,
        &format!("/api/v1/campaigns/{id}"),
        json!({ "name": "Harusi ya Amina na Juma" }),
    )
    .await;
    let campaign = expect_json(response, StatusCode::OK).await;

    // The edit landed and the run state is gone.
    assert_eq!(campaign["name"], "Harusi ya Amina na Juma");
    assert_eq!(campaign["status_id"], CampaignStatus::Draft.id());
    assert_eq!(campaign["total_recipients"], 0);
    assert_eq!(campaign["sent_count"], 0);
    assert_eq!(campaign["failed_count"], 0);
    assert!(campaign["started_at"].is_null());
    assert!(campaign["completed_at"].is_null());

    // The failed recipient is pending again with its error cleared.
    let recipients = RecipientRepo::list_by_campaign(&pool, id).await.unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].status_id, RecipientStatus::Pending.id());
    assert!(recipients[0].error_message.is_none());
}

// ---------------------------------------------------------------------------
// Test: send with zero pending recipients is rejected without mutation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sending_with_no_pending_recipients_is_rejected(pool: PgPool) {
    let app = common::build_test_app_with_pool(pool.clone());
    let id = create_campaign(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/campaigns/{id}/send"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = expect_json(response, StatusCode::CONFLICT).await;
    assert_eq!(body["code"], "INVALID_STATE");

    // The campaign is untouched and still sendable once it has
    // recipients.
    let campaign = CampaignRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(campaign.status_id, CampaignStatus::Draft.id());
    assert!(campaign.started_at.is_none());
    assert_eq!(campaign.total_recipients, 0);
}

// ---------------------------------------------------------------------------
// Test: a duplicate recipient phone within a campaign maps to 409
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_recipient_phone_maps_to_conflict(pool: PgPool) {
    let app = common::build_test_app_with_pool(pool);
    let id = create_campaign(&app).await;

    let response = add_recipient(&app, id, "0712345678").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The same number in international format normalizes to the same
    // canonical phone and trips the unique constraint.
    let response = add_recipient(&app, id, "+255712345678").await;
    let body = expect_json(response, StatusCode::CONFLICT).await;
    assert_eq!(body["code"], "CONFLICT");
}
