//! Moderation integration tests (MI-01 through MI-09)

use axum::http::{Method, StatusCode};
use serde_json::json;

use motionbooth_submissions::SubmissionStatus;

use crate::common::{authed, authed_json, TestApp};

fn photo_action(id: uuid::Uuid) -> String {
    format!("/moderation/photos/{id}/action")
}

fn video_action(id: uuid::Uuid) -> String {
    format!("/moderation/videos/{id}/action")
}

// MI-01: Pending photo queue lists uploads with a signed photo URL
#[tokio::test]
async fn test_pending_photos_queue() {
    let app = TestApp::new();
    let code = app.submit_photo(&[("user_prompt", "wave")]).await;

    let (status, body) = app
        .send(authed(Method::GET, "/moderation/pending_photos"))
        .await;

    assert_eq!(status, StatusCode::OK);
    let queue = body.as_array().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["submission_code"], code);
    assert_eq!(queue[0]["user_prompt"], "wave");
    assert!(queue[0]["photo_url"]
        .as_str()
        .unwrap()
        .starts_with("https://storage.mock.local/motionbooth-test/"));
    assert!(queue[0]["video_url"].is_null());
}

// MI-02: Approving a photo queues exactly one generation task
#[tokio::test]
async fn test_approve_photo_enqueues_generation() {
    let app = TestApp::new();
    let id = app.approved_submission(None).await;

    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::PhotoApproved);
    assert!(record.photo_moderated_at.is_some());
    assert_eq!(app.tasks.recorded_enqueues(), vec![id]);
}

// MI-03: Rejection stores the comment, never enqueues, and is shown to the user
#[tokio::test]
async fn test_reject_photo_with_comment() {
    let app = TestApp::new();
    let code = app.submit_photo(&[]).await;
    let id = app.record(&code).await.id;

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &photo_action(id),
            json!({ "decision": "reject", "comment": "Face not visible" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.tasks.recorded_enqueues().is_empty());

    let (_, body) = app
        .send(authed(Method::GET, &format!("/submissions/{code}/status")))
        .await;
    assert_eq!(body["status"], "PHOTO_REJECTED");
    assert_eq!(body["moderation_comment"], "Face not visible");
}

// MI-04: A rejected photo cannot be approved afterwards
#[tokio::test]
async fn test_reject_then_approve_conflicts() {
    let app = TestApp::new();
    let code = app.submit_photo(&[]).await;
    let id = app.record(&code).await.id;

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &photo_action(id),
            json!({ "decision": "reject" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(authed_json(
            Method::POST,
            &photo_action(id),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("PHOTO_REJECTED"));
    assert_eq!(app.record_by_id(id).await.status, SubmissionStatus::PhotoRejected);
    assert!(app.tasks.recorded_enqueues().is_empty());
}

// MI-05: Decisions on unknown submissions are 404; bad decisions are 400
#[tokio::test]
async fn test_decision_on_unknown_or_malformed() {
    let app = TestApp::new();

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &photo_action(uuid::Uuid::new_v4()),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let code = app.submit_photo(&[]).await;
    let id = app.record(&code).await.id;
    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &photo_action(id),
            json!({ "decision": "maybe" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// MI-06: Enqueue outage leaves the photo approved; retry_generation recovers it
#[tokio::test]
async fn test_enqueue_failure_then_manual_retry() {
    let app = TestApp::new();
    let code = app.submit_photo(&[]).await;
    let id = app.record(&code).await.id;
    app.tasks.set_fail(true);

    let (status, body) = app
        .send(authed_json(
            Method::POST,
            &photo_action(id),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(app.record_by_id(id).await.status, SubmissionStatus::PhotoApproved);
    assert!(app.tasks.recorded_enqueues().is_empty());

    app.tasks.set_fail(false);
    let (status, _) = app
        .send(authed(
            Method::POST,
            &format!("/moderation/retry_generation/{id}"),
        ))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(app.tasks.recorded_enqueues(), vec![id]);
}

// MI-07: retry_generation refuses submissions that are not waiting for generation
#[tokio::test]
async fn test_retry_generation_wrong_state() {
    let app = TestApp::new();
    let code = app.submit_photo(&[]).await;
    let id = app.record(&code).await.id;

    let (status, _) = app
        .send(authed(
            Method::POST,
            &format!("/moderation/retry_generation/{id}"),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(authed(
            Method::POST,
            &format!("/moderation/retry_generation/{}", uuid::Uuid::new_v4()),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.tasks.recorded_enqueues().is_empty());
}

// MI-08: Video rejection records the comment; video approval is refused afterwards
#[tokio::test]
async fn test_reject_video() {
    let app = TestApp::new();
    let id = app.approved_submission(None).await;
    app.deliver(id, 0).await;

    let (_, queue) = app
        .send(authed(Method::GET, "/moderation/pending_videos"))
        .await;
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert!(queue[0]["video_url"].is_string());

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &video_action(id),
            json!({ "decision": "reject", "comment": "Looks distorted" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::VideoRejected);
    assert_eq!(record.moderation_comment.as_deref(), Some("Looks distorted"));
    assert!(record.video_moderated_at.is_some());

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &video_action(id),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// MI-09: Video decisions before generation are refused
#[tokio::test]
async fn test_video_decision_before_generation() {
    let app = TestApp::new();
    let id = app.approved_submission(None).await;

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &video_action(id),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(authed(Method::GET, &format!("/moderation/submissions/{id}")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PHOTO_APPROVED");
}
