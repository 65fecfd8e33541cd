//! Prompt assistance integration tests (PI-01 through PI-05)

use axum::http::StatusCode;

use motionbooth_llm::mock::MOCK_SUGGESTIONS;

use crate::common::{multipart_request, TestApp, TEST_PHOTO};

// PI-01: Suggestions come back as a plain list and carry the photo
#[tokio::test]
async fn test_suggest_prompts() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request(
            "/prompts/suggestions",
            Some(("selfie.jpg", "image/jpeg", TEST_PHOTO)),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let prompts: Vec<&str> = body["prompts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(prompts, MOCK_SUGGESTIONS.to_vec());

    let requests = app.llm.recorded_requests();
    assert_eq!(requests.len(), 1);
    let message = requests[0].messages.last().unwrap();
    assert!(message.content.contains("Travel"));
    assert!(message.image.is_some());
}

// PI-02: Unparseable model output is a bad gateway, not a crash
#[tokio::test]
async fn test_suggest_prompts_garbled_answer() {
    let app = TestApp::new();
    app.llm
        .set_response(Some("I'd rather not answer in JSON".to_string()));

    let (status, body) = app
        .send(multipart_request(
            "/prompts/suggestions",
            Some(("selfie.jpg", "image/jpeg", TEST_PHOTO)),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "PROVIDER_ERROR");
}

// PI-03: Draft rewrites the user's idea
#[tokio::test]
async fn test_draft_prompt() {
    let app = TestApp::new();
    app.llm
        .set_response(Some("\"Slow zoom in as confetti falls around the subject\"".to_string()));

    let (status, body) = app
        .send(multipart_request(
            "/prompts/draft",
            Some(("selfie.png", "image/png", TEST_PHOTO)),
            &[("text", "confetti and zoom")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["prompt"],
        "Slow zoom in as confetti falls around the subject"
    );
    let requests = app.llm.recorded_requests();
    assert!(requests[0].system_prompt.is_some());
    assert!(requests[0].messages[0].content.contains("confetti and zoom"));
}

// PI-04: Draft without text is a validation error and never reaches the model
#[tokio::test]
async fn test_draft_prompt_requires_text() {
    let app = TestApp::new();

    let (status, _) = app
        .send(multipart_request(
            "/prompts/draft",
            Some(("selfie.png", "image/png", TEST_PHOTO)),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.llm.recorded_requests().is_empty());
}

// PI-05: Non-image uploads are refused
#[tokio::test]
async fn test_suggest_prompts_rejects_non_image() {
    let app = TestApp::new();

    let (status, _) = app
        .send(multipart_request(
            "/prompts/suggestions",
            Some(("doc.pdf", "application/pdf", b"%PDF-1.4")),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.llm.recorded_requests().is_empty());
}
