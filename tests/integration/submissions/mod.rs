//! Submission intake and status integration tests (SI-01 through SI-13)

use axum::http::{Method, StatusCode};
use serde_json::json;

use motionbooth_submissions::{SubmissionStatus, SubmissionStore};

use crate::common::{authed, authed_json, multipart_request, unauthed, TestApp, TEST_PHOTO};

// SI-01: Upload stores the photo and records a pending submission
#[tokio::test]
async fn test_create_submission_records_pending_photo() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request(
            "/submissions",
            Some(("selfie.png", "image/png", TEST_PHOTO)),
            &[
                ("user_prompt", "  zoom in  "),
                ("user_name", "Ada"),
                ("email", "ada@example.com"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING_PHOTO_APPROVAL");
    let code = body["submission_code"].as_str().unwrap();
    assert_eq!(code.len(), 10);

    let record = app.record(code).await;
    assert_eq!(record.status, SubmissionStatus::PendingPhotoApproval);
    assert_eq!(record.user_prompt.as_deref(), Some("zoom in"));
    assert_eq!(record.user_name.as_deref(), Some("Ada"));
    assert!(record.photo_ref.starts_with("mock://motionbooth-test/"));
    assert!(record.photo_ref.ends_with(".png"));
    assert_eq!(app.assets.object_count(), 1);
}

// SI-02: Missing photo part is rejected before anything is stored
#[tokio::test]
async fn test_create_submission_requires_photo() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request("/submissions", None, &[("user_prompt", "wave")]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(app.assets.object_count(), 0);
}

// SI-03: Non-image uploads are rejected
#[tokio::test]
async fn test_create_submission_rejects_unsupported_type() {
    let app = TestApp::new();

    let (status, _) = app
        .send(multipart_request(
            "/submissions",
            Some(("notes.txt", "text/plain", b"hello")),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.assets.object_count(), 0);
}

// SI-04: A malformed email fails validation and nothing is uploaded
#[tokio::test]
async fn test_create_submission_rejects_bad_email() {
    let app = TestApp::new();

    let (status, _) = app
        .send(multipart_request(
            "/submissions",
            Some(("selfie.png", "image/png", TEST_PHOTO)),
            &[("email", "not-an-email")],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.assets.object_count(), 0);
}

// SI-05: Storage outage surfaces as 503 and leaves no record
#[tokio::test]
async fn test_create_submission_upload_failure() {
    let app = TestApp::new();
    app.assets.set_fail_uploads(true);

    let (status, body) = app
        .send(multipart_request(
            "/submissions",
            Some(("selfie.png", "image/png", TEST_PHOTO)),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    let (_, count) = app
        .send(authed(
            Method::GET,
            "/submissions/count?status=PENDING_PHOTO_APPROVAL",
        ))
        .await;
    assert_eq!(count["count"], 0);
}

// SI-06: Every management endpoint requires the API key
#[tokio::test]
async fn test_endpoints_require_api_key() {
    let app = TestApp::new();
    let id = uuid::Uuid::new_v4();

    for (method, uri) in [
        (Method::GET, "/submissions?status=PHOTO_APPROVED".to_string()),
        (Method::GET, "/submissions/count?status=PHOTO_APPROVED".to_string()),
        (Method::GET, "/moderation/pending_photos".to_string()),
        (Method::POST, format!("/moderation/retry_generation/{id}")),
        (Method::POST, format!("/generation/{id}")),
        (Method::POST, "/internal/sweep".to_string()),
    ] {
        let (status, body) = app.send(unauthed(method.clone(), &uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(body["error"].is_object());
    }
}

// SI-07: A wrong key is refused
#[tokio::test]
async fn test_wrong_api_key_rejected() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/moderation/pending_photos")
        .header(motionbooth_auth::API_KEY_HEADER, "not-the-key")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// SI-08: Public status lookup needs no key and hides moderation notes
#[tokio::test]
async fn test_status_lookup_is_public() {
    let app = TestApp::new();
    let code = app.submit_photo(&[]).await;

    let (status, body) = app
        .send(unauthed(Method::GET, &format!("/submissions/{code}/status")))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submission_code"], code);
    assert_eq!(body["status"], "PENDING_PHOTO_APPROVAL");
    assert!(body["video_url"].is_null());
    assert!(body["moderation_comment"].is_null());
}

// SI-09: Unknown code is 404
#[tokio::test]
async fn test_status_lookup_unknown_code() {
    let app = TestApp::new();

    let (status, body) = app
        .send(unauthed(Method::GET, "/submissions/ZZZZZZZZZZ/status"))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// SI-10: List and count filter by status, oldest first
#[tokio::test]
async fn test_list_and_count_by_status() {
    let app = TestApp::new();
    let first = app.submit_photo(&[]).await;
    let second = app.submit_photo(&[]).await;
    app.approved_submission(None).await;

    let (status, body) = app
        .send(authed(Method::GET, "/submissions?status=PENDING_PHOTO_APPROVAL"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["submission_code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec![first.as_str(), second.as_str()]);

    let (_, paged) = app
        .send(authed(
            Method::GET,
            "/submissions?status=PENDING_PHOTO_APPROVAL&skip=1&limit=1",
        ))
        .await;
    assert_eq!(paged.as_array().unwrap().len(), 1);
    assert_eq!(paged[0]["submission_code"], second);

    let (_, count) = app
        .send(authed(Method::GET, "/submissions/count?status=PHOTO_APPROVED"))
        .await;
    assert_eq!(count["status"], "PHOTO_APPROVED");
    assert_eq!(count["count"], 1);
}

// SI-11: Prompt may change before generation and is normalized
#[tokio::test]
async fn test_update_prompt_before_generation() {
    let app = TestApp::new();
    let code = app.submit_photo(&[("user_prompt", "wave")]).await;
    let id = app.record(&code).await.id;

    let (status, body) = app
        .send(authed_json(
            Method::PUT,
            &format!("/submissions/{id}/prompt"),
            json!({ "user_prompt": "  slow zoom in  " }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_prompt"], "slow zoom in");
    assert_eq!(body["status"], "PENDING_PHOTO_APPROVAL");

    // Blank clears it
    let (status, body) = app
        .send(authed_json(
            Method::PUT,
            &format!("/submissions/{id}/prompt"),
            json!({ "user_prompt": "   " }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user_prompt"].is_null());
    assert_eq!(app.record(&code).await.user_prompt, None);
}

// SI-12: Prompt is frozen once generation has run; unknown id is 404
#[tokio::test]
async fn test_update_prompt_after_generation_conflicts() {
    let app = TestApp::new();
    let id = app.approved_submission(Some("wave")).await;
    let (status, _) = app.deliver(id, 0).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(authed_json(
            Method::PUT,
            &format!("/submissions/{id}/prompt"),
            json!({ "user_prompt": "jump" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("PENDING_VIDEO_APPROVAL"));
    assert_eq!(app.record_by_id(id).await.user_prompt.as_deref(), Some("wave"));

    let (status, _) = app
        .send(authed_json(
            Method::PUT,
            &format!("/submissions/{}/prompt", uuid::Uuid::new_v4()),
            json!({ "user_prompt": "jump" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// SI-13: A store outage after upload is a 503; the uploaded photo has no record
#[tokio::test]
async fn test_create_submission_store_failure_after_upload() {
    let app = TestApp::new();
    app.store.set_unavailable(true);

    let (status, body) = app
        .send(multipart_request(
            "/submissions",
            Some(("selfie.png", "image/png", TEST_PHOTO)),
            &[("user_prompt", "wave")],
        ))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.get("submission_code").is_none());
    assert_eq!(app.assets.object_count(), 1);

    app.store.set_unavailable(false);
    assert_eq!(
        app.store
            .count_by_status(SubmissionStatus::PendingPhotoApproval)
            .await
            .unwrap(),
        0
    );
}
