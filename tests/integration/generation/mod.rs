//! Generation task delivery and sweep integration tests (GI-01 through GI-11)

use axum::http::{Method, StatusCode};
use serde_json::json;

use motionbooth_submissions::{FieldUpdates, SubmissionEvent, SubmissionStatus, SubmissionStore};
use motionbooth_videogen::mock::MockOutcome;

use crate::common::{authed, authed_json, unauthed, TestApp};

// GI-01: Two polls to success records the provider's reference
#[tokio::test]
async fn test_delivery_polls_until_success() {
    let app = TestApp::new();
    let behavior = app.provider.behavior();
    behavior.set_polls_until_done(2);
    behavior.set_asset_ref("gs://bucket/v1.mp4");
    let id = app.approved_submission(Some("wave")).await;

    let (status, body) = app.deliver(id, 0).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["video_ref"], "gs://bucket/v1.mp4");
    assert_eq!(body["redeliver"], false);
    assert_eq!(app.provider.poll_count(), 2);

    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::PendingVideoApproval);
    assert_eq!(record.video_ref.as_deref(), Some("gs://bucket/v1.mp4"));
    assert_eq!(record.error_message, None);
}

// GI-02: Redelivery after completion is acknowledged without a new job
#[tokio::test]
async fn test_redelivery_after_completion_is_noop() {
    let app = TestApp::new();
    let id = app.approved_submission(None).await;

    let (status, _) = app.deliver(id, 0).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.deliver(id, 1).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_handled");
    assert_eq!(app.provider.recorded_submissions().len(), 1);
    assert_eq!(
        app.record_by_id(id).await.status,
        SubmissionStatus::PendingVideoApproval
    );
}

// GI-03: Concurrent deliveries of the same task start exactly one job
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_single_job() {
    let app = std::sync::Arc::new(TestApp::new());
    let id = app.approved_submission(None).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.deliver(id, 0).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        outcomes.push(body["outcome"].as_str().unwrap().to_string());
    }

    assert_eq!(outcomes.iter().filter(|o| *o == "completed").count(), 1);
    assert_eq!(
        outcomes.iter().filter(|o| *o == "already_handled").count(),
        3
    );
    assert_eq!(app.provider.recorded_submissions().len(), 1);
}

// GI-04: Failures are redelivered until the retry budget runs out
#[tokio::test]
async fn test_failure_retry_budget() {
    let app = TestApp::new();
    let behavior = app.provider.behavior();
    behavior.set_outcome(MockOutcome::Fail);
    behavior.set_failure_reason("Content policy violation");
    let id = app.approved_submission(None).await;

    let (status, body) = app.deliver(id, 0).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["outcome"], "retry_requested");
    assert_eq!(body["redeliver"], true);
    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::PendingGenerationRetry);
    assert_eq!(record.error_message.as_deref(), Some("Content policy violation"));

    let (status, _) = app.deliver(id, 1).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        app.record_by_id(id).await.status,
        SubmissionStatus::PendingGenerationRetry
    );

    let (status, body) = app.deliver(id, 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "failed");
    assert_eq!(body["reason"], "Content policy violation");
    assert_eq!(
        app.record_by_id(id).await.status,
        SubmissionStatus::GenerationFailed
    );
    assert_eq!(app.provider.recorded_submissions().len(), 3);

    // Terminal: further deliveries are acknowledged and do nothing
    let (status, body) = app.deliver(id, 3).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_handled");
    assert_eq!(app.provider.recorded_submissions().len(), 3);
}

// GI-05: A job that never finishes times out after the polling budget
#[tokio::test]
async fn test_polling_timeout() {
    let app = TestApp::new();
    app.provider.behavior().set_outcome(MockOutcome::Stall);
    let id = app.approved_submission(None).await;

    let (status, body) = app.deliver(id, 0).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["reason"], "Polling timed out");
    assert_eq!(app.provider.poll_count(), 3);
    assert_eq!(
        app.record_by_id(id).await.error_message.as_deref(),
        Some("Polling timed out")
    );
}

// GI-06: Provider errors on submit count as a failed attempt
#[tokio::test]
async fn test_provider_submit_error() {
    let app = TestApp::new();
    app.provider.behavior().set_outcome(MockOutcome::SubmitError);
    let id = app.approved_submission(None).await;

    let (status, body) = app.deliver(id, 2).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "failed");
    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::GenerationFailed);
    assert!(record.error_message.is_some());
}

// GI-07: A retry that succeeds clears the previous error
#[tokio::test]
async fn test_retry_success_clears_error() {
    let app = TestApp::new();
    app.provider.behavior().set_outcome(MockOutcome::Fail);
    let id = app.approved_submission(None).await;
    app.deliver(id, 0).await;
    assert!(app.record_by_id(id).await.error_message.is_some());

    app.provider.behavior().set_outcome(MockOutcome::Succeed);
    let (status, body) = app.deliver(id, 1).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::PendingVideoApproval);
    assert_eq!(record.error_message, None);
}

// GI-08: Unknown submissions are acknowledged so the task is dropped
#[tokio::test]
async fn test_unknown_submission_acknowledged() {
    let app = TestApp::new();

    let (status, body) = app.deliver(uuid::Uuid::new_v4(), 0).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "not_found");
    assert!(app.provider.recorded_submissions().is_empty());
}

// GI-09: Sweep moves stalled generations back to retry and re-queues them
#[tokio::test]
async fn test_sweep_recovers_stalled_generation() {
    let app = TestApp::new();
    let id = app.approved_submission(None).await;

    // A delivery claimed the record and then died
    let claimed = app
        .store
        .transition(id, SubmissionEvent::StartGeneration, FieldUpdates::none())
        .await
        .unwrap();
    assert!(claimed);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let (status, body) = app.send(authed(Method::POST, "/internal/sweep")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["swept"], 1);
    assert_eq!(body["stalled"], 1);
    assert_eq!(body["requeued"], 0);
    let record = app.record_by_id(id).await;
    assert_eq!(record.status, SubmissionStatus::PendingGenerationRetry);
    assert!(record.error_message.is_some());
    assert_eq!(app.tasks.recorded_enqueues(), vec![id, id]);

    // The re-queued delivery picks it up again
    let (status, body) = app.deliver(id, 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");

    let (_, body) = app.send(authed(Method::POST, "/internal/sweep")).await;
    assert_eq!(body["swept"], 0);
}

// GI-10: Full journey from upload to a signed video link for the user
#[tokio::test]
async fn test_end_to_end_zoom_in() {
    let app = TestApp::new();
    app.provider.behavior().set_asset_ref("gs://bucket/v1.mp4");
    let code = app.submit_photo(&[("user_prompt", "zoom in")]).await;
    let id = app.record(&code).await.id;

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &format!("/moderation/photos/{id}/action"),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.tasks.recorded_enqueues(), vec![id]);

    let (status, _) = app.deliver(id, 0).await;
    assert_eq!(status, StatusCode::OK);
    let submitted = app.provider.recorded_submissions();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].prompt.as_deref(), Some("zoom in"));
    assert_eq!(submitted[0].photo_ref, app.record(&code).await.photo_ref);

    let (_, body) = app
        .send(unauthed(Method::GET, &format!("/submissions/{code}/status")))
        .await;
    assert_eq!(body["status"], "PENDING_VIDEO_APPROVAL");
    assert!(body["video_url"].is_null());

    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &format!("/moderation/videos/{id}/action"),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(unauthed(Method::GET, &format!("/submissions/{code}/status")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "VIDEO_APPROVED");
    assert_eq!(
        body["video_url"],
        "https://storage.mock.local/bucket/v1.mp4?expires_in=3600"
    );

    let (_, listed) = app
        .send(authed(Method::GET, "/submissions?status=VIDEO_APPROVED"))
        .await;
    assert_eq!(listed[0]["video_url"], body["video_url"]);
}

// GI-11: An approval whose task was never queued is picked up by the sweep
#[tokio::test]
async fn test_sweep_requeues_approval_with_lost_task() {
    let app = TestApp::new();
    let code = app.submit_photo(&[]).await;
    let id = app.record(&code).await.id;

    app.tasks.set_fail(true);
    let (status, _) = app
        .send(authed_json(
            Method::POST,
            &format!("/moderation/photos/{id}/action"),
            json!({ "decision": "approve" }),
        ))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(app.tasks.recorded_enqueues().is_empty());
    app.tasks.set_fail(false);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let (status, body) = app.send(authed(Method::POST, "/internal/sweep")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requeued"], 1);
    assert_eq!(body["stalled"], 0);
    assert_eq!(app.tasks.recorded_enqueues(), vec![id]);
    assert_eq!(app.record_by_id(id).await.status, SubmissionStatus::PhotoApproved);

    let (status, body) = app.deliver(id, 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
}
