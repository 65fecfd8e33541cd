//! Common test utilities for integration tests
//!
//! Builds the full application router over the in-memory store and the mock
//! adapters, and keeps handles to every mock so tests can program behavior
//! and inspect recorded calls.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use motionbooth_auth::{AuthBackend, AuthConfig, API_KEY_HEADER};
use motionbooth_llm::mock::MockLlmService;
use motionbooth_storage::mock::MockAssetGateway;
use motionbooth_submissions::{
    GenerationPolicy, InMemorySubmissionStore, Submission, SubmissionStore, SubmissionsSettings,
    SubmissionsState,
};
use motionbooth_tasks::mock::MockTaskDispatcher;
use motionbooth_videogen::mock::MockGenerationProvider;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_PHOTO: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

const BOUNDARY: &str = "motionbooth-test-boundary";

/// Application wired over mocks
pub struct TestApp {
    pub router: Router,
    pub store: InMemorySubmissionStore,
    pub assets: MockAssetGateway,
    pub provider: MockGenerationProvider,
    pub tasks: MockTaskDispatcher,
    pub llm: MockLlmService,
}

impl TestApp {
    /// Zero poll interval, three polls per attempt, two redeliveries
    pub fn new() -> Self {
        Self::with_policy(GenerationPolicy {
            poll_interval: Duration::ZERO,
            max_polling_attempts: 3,
            max_retries: 2,
        })
    }

    pub fn with_policy(policy: GenerationPolicy) -> Self {
        let store = InMemorySubmissionStore::new();
        let assets = MockAssetGateway::new("motionbooth-test");
        let provider = MockGenerationProvider::new();
        let tasks = MockTaskDispatcher::new();
        let llm = MockLlmService::new();

        let state = SubmissionsState::new(
            Arc::new(store.clone()),
            Arc::new(assets.clone()),
            Arc::new(provider.clone()),
            Arc::new(tasks.clone()),
            Arc::new(llm.clone()),
            AuthBackend::new(AuthConfig {
                api_key: TEST_API_KEY.to_string(),
            }),
            SubmissionsSettings {
                policy,
                sweep_threshold: Duration::ZERO,
                signed_url_ttl: Duration::from_secs(3600),
                prompt_theme: "Travel".to_string(),
            },
        );

        Self {
            router: motionbooth_app::create_router(state),
            store,
            assets,
            provider,
            tasks,
            llm,
        }
    }

    /// Send a request and parse the JSON body (Null when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, parsed)
    }

    /// Upload a PNG with the given text fields; returns the submission code
    pub async fn submit_photo(&self, fields: &[(&str, &str)]) -> String {
        let (status, body) = self
            .send(multipart_request(
                "/submissions",
                Some(("photo.png", "image/png", TEST_PHOTO)),
                fields,
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
        body["submission_code"].as_str().unwrap().to_string()
    }

    /// Fetch the stored record behind a submission code
    pub async fn record(&self, code: &str) -> Submission {
        self.store.get_by_code(code).await.unwrap().unwrap()
    }

    pub async fn record_by_id(&self, id: Uuid) -> Submission {
        self.store.get_by_id(id).await.unwrap().unwrap()
    }

    /// Submit a photo and approve it; returns the submission id
    pub async fn approved_submission(&self, prompt: Option<&str>) -> Uuid {
        let fields: Vec<(&str, &str)> = prompt.map(|p| ("user_prompt", p)).into_iter().collect();
        let code = self.submit_photo(&fields).await;
        let id = self.record(&code).await.id;

        let (status, _) = self
            .send(authed_json(
                Method::POST,
                &format!("/moderation/photos/{id}/action"),
                serde_json::json!({ "decision": "approve" }),
            ))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        id
    }

    /// Deliver the generation task with the given redelivery count
    pub async fn deliver(&self, id: Uuid, redelivery_count: u32) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/generation/{id}"))
            .header(API_KEY_HEADER, TEST_API_KEY)
            .header(motionbooth_tasks::RETRY_COUNT_HEADER, redelivery_count.to_string())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}

/// Request carrying the API key
pub fn authed(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(API_KEY_HEADER, TEST_API_KEY)
        .body(Body::empty())
        .unwrap()
}

pub fn authed_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(API_KEY_HEADER, TEST_API_KEY)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Request without credentials
pub fn unauthed(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Authenticated multipart/form-data request with an optional `photo` part
pub fn multipart_request(
    uri: &str,
    photo: Option<(&str, &str, &[u8])>,
    fields: &[(&str, &str)],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, content_type, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(API_KEY_HEADER, TEST_API_KEY)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
