//! End-to-end tests of the HTTP surface against stubbed collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use vitae_core::Result;
use vitae_core::model::JobPosting;
use vitae_pool::{Extraction, JobOptions, JobPayload, PoolConfig, RateLimitConfig, Scraper};
use vitae_server::middleware::{RecoveryConfig, RouterRecoveryExt};
use vitae_server::service::{ScreenshotRenderer, ServiceConfig, ServiceState};
use vitae_server::{TaskManager, routes};

/// Extraction stub; panics on URLs containing "panic".
struct StubScraper;

#[async_trait]
impl Scraper for StubScraper {
    async fn extract(
        &self,
        payload: &JobPayload,
        _options: &JobOptions,
        _cancel: &CancellationToken,
    ) -> Result<Extraction> {
        let description = match payload {
            JobPayload::Url(url) => {
                if url.contains("panic") {
                    panic!("scripted scraper panic");
                }
                format!("posting fetched from {url}")
            }
            JobPayload::Description(text) => text.clone(),
        };

        Ok(Extraction {
            posting: JobPosting {
                title: Some("Senior Rust Engineer".into()),
                company_name: Some("Acme".into()),
                description,
                ..Default::default()
            },
            engine: "stub".into(),
        })
    }
}

/// Renderer stub returning a fixed PNG payload.
struct StubRenderer;

#[async_trait]
impl ScreenshotRenderer for StubRenderer {
    async fn render(&self, resume_id: &str) -> Result<Bytes> {
        Ok(Bytes::from(format!("png-for-{resume_id}")))
    }

    async fn health(&self) -> bool {
        true
    }
}

fn test_config() -> ServiceConfig {
    ServiceConfig {
        pool: PoolConfig {
            workers: 2,
            queue_size: 16,
            default_timeout: Duration::from_secs(5),
            rate_limit: RateLimitConfig {
                requests_per_minute: 60_000,
                burst: 100,
                max_failures: 100,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

fn test_state() -> ServiceState {
    ServiceState::builder(test_config())
        .with_scraper(Arc::new(StubScraper))
        .with_renderer(Arc::new(StubRenderer))
        .build()
        .expect("service state")
}

fn server_for(state: ServiceState) -> TestServer {
    let app = routes(state).with_recovery(RecoveryConfig::default());
    TestServer::new(app).expect("test server")
}

async fn poll_terminal(server: &TestServer, process_id: &str) -> Value {
    for _ in 0..200 {
        let response = server.get(&format!("/api/v1/tasks/{process_id}")).await;
        if response.status_code() == 200 {
            let record: Value = response.json();
            let status = record["status"].as_str().unwrap_or_default().to_string();
            if status == "SUCCESS" || status == "FAILURE" {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {process_id} never reached a terminal state");
}

fn assert_process_id_shape(process_id: &str, kind: &str) {
    let parts: Vec<&str> = process_id.splitn(3, '_').collect();
    assert_eq!(parts.len(), 3, "unexpected id shape: {process_id}");
    assert_eq!(parts[0], kind);
    assert_eq!(parts[1].len(), 8);
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[2].len(), 36);
}

#[tokio::test]
async fn scrape_accepts_then_completes() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/scrape")
        .json(&json!({"url": "https://example.com/job/1"}))
        .await;
    assert_eq!(response.status_code(), 202);

    let body: Value = response.json();
    assert_eq!(body["status"], "ACCEPTED");
    let process_id = body["processId"].as_str().expect("processId present");
    assert_process_id_shape(process_id, "scrape");

    let record = poll_terminal(&server, process_id).await;
    assert_eq!(record["status"], "SUCCESS");
    assert_eq!(record["result"]["engine"], "stub");
    assert_eq!(record["result"]["posting"]["title"], "Senior Rust Engineer");
    assert!(record["error"].is_null());

    state.shutdown().await;
}

#[tokio::test]
async fn scrape_by_description_completes() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/scrape")
        .json(&json!({"description": "Staff Engineer at Initech. Rust required."}))
        .await;
    assert_eq!(response.status_code(), 202);

    let body: Value = response.json();
    let process_id = body["processId"].as_str().expect("processId present");
    let record = poll_terminal(&server, process_id).await;
    assert_eq!(record["status"], "SUCCESS");

    state.shutdown().await;
}

#[tokio::test]
async fn empty_scrape_body_is_rejected_without_creating_a_task() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server.post("/api/v1/scrape").json(&json!({})).await;
    assert_eq!(response.status_code(), 400);

    let body: Value = response.json();
    let code = body["error"].as_str().expect("error code present");
    assert!(
        code == "validation_failed" || code == "invalid_request",
        "unexpected code {code}"
    );

    // No record was created for the rejected submission.
    assert_eq!(state.tasks().len(), 0);

    state.shutdown().await;
}

#[tokio::test]
async fn scrape_with_both_targets_is_rejected() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/scrape")
        .json(&json!({
            "url": "https://example.com/job/1",
            "description": "also text"
        }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(state.tasks().len(), 0);

    state.shutdown().await;
}

#[tokio::test]
async fn scraper_panic_becomes_internal_failure_and_server_survives() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/scrape")
        .json(&json!({"url": "https://example.com/panic/now"}))
        .await;
    assert_eq!(response.status_code(), 202);
    let body: Value = response.json();
    let process_id = body["processId"].as_str().expect("processId present");

    let record = poll_terminal(&server, process_id).await;
    assert_eq!(record["status"], "FAILURE");
    assert_eq!(record["error"]["code"], "internal");
    assert!(record["result"].is_null());

    // The server keeps accepting and completing work.
    let response = server
        .post("/api/v1/scrape")
        .json(&json!({"url": "https://example.com/job/2"}))
        .await;
    assert_eq!(response.status_code(), 202);
    let body: Value = response.json();
    let record = poll_terminal(&server, body["processId"].as_str().unwrap()).await;
    assert_eq!(record["status"], "SUCCESS");

    state.shutdown().await;
}

#[tokio::test]
async fn unknown_process_ids_return_not_found() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .get("/api/v1/tasks/scrape_20250101_00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(response.status_code(), 404);

    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");

    state.shutdown().await;
}

#[tokio::test]
async fn screenshot_replaces_previous_renders_for_the_resume() {
    let state = test_state();
    let server = server_for(state.clone());

    for _ in 0..2 {
        let response = server
            .post("/api/v1/resume/screenshot")
            .json(&json!({"resume_id": "res_42"}))
            .await;
        assert_eq!(response.status_code(), 202);

        let body: Value = response.json();
        let process_id = body["processId"].as_str().expect("processId present");
        assert_process_id_shape(process_id, "screenshot");

        let record = poll_terminal(&server, process_id).await;
        assert_eq!(record["status"], "SUCCESS");
    }

    // Only the latest render remains under the resume's prefix.
    let keys = state
        .store()
        .list_keys("screenshots/res_42/")
        .await
        .expect("list keys");
    assert_eq!(keys.len(), 1);

    state.shutdown().await;
}

#[tokio::test]
async fn screenshot_without_resume_id_is_rejected() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/resume/screenshot")
        .json(&json!({"resume_id": ""}))
        .await;
    assert_eq!(response.status_code(), 400);

    state.shutdown().await;
}

#[tokio::test]
async fn tailor_without_provider_fails_synchronously() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/resume/tailor")
        .json(&json!({
            "base_resume": {"id": "res_1", "sections": []},
            "job": {"title": "Engineer", "company_name": "Acme"},
            "resume_id": "res_1"
        }))
        .await;
    assert_eq!(response.status_code(), 500);

    let body: Value = response.json();
    assert_eq!(body["error"], "configuration_error");
    assert_eq!(state.tasks().len(), 0);

    state.shutdown().await;
}

#[tokio::test]
async fn export_produces_a_latex_artifact() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/resume/export")
        .json(&json!({
            "resume": {
                "id": "res_7",
                "name": "Ada Lovelace",
                "sections": [{"type": "summary", "text": "Engineer & researcher"}]
            },
            "theme": "classic"
        }))
        .await;
    assert_eq!(response.status_code(), 202);

    let body: Value = response.json();
    let process_id = body["processId"].as_str().expect("processId present");
    assert_process_id_shape(process_id, "export");

    let record = poll_terminal(&server, process_id).await;
    assert_eq!(record["status"], "SUCCESS");
    let key = record["result"]["key"].as_str().expect("key present");
    assert!(key.starts_with("exports/res_7/"));
    assert!(key.ends_with(".tex"));
    assert_eq!(record["result"]["format"], "latex");

    state.shutdown().await;
}

#[tokio::test]
async fn export_with_unknown_theme_fails_as_task() {
    let state = test_state();
    let server = server_for(state.clone());

    let response = server
        .post("/api/v1/resume/export")
        .json(&json!({
            "resume": {"id": "res_7", "sections": []},
            "theme": "neon"
        }))
        .await;
    assert_eq!(response.status_code(), 202);

    let body: Value = response.json();
    let record = poll_terminal(&server, body["processId"].as_str().unwrap()).await;
    assert_eq!(record["status"], "FAILURE");
    assert_eq!(record["error"]["code"], "validation_failed");

    state.shutdown().await;
}

#[tokio::test]
async fn health_surfaces_respond() {
    let state = test_state();
    let server = server_for(state.clone());

    for path in ["/health", "/ready", "/live", "/status"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 200, "{path} failed");
    }

    let response = server.get("/api/v1/metrics/workers").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["healthy"], true);

    let response = server.get("/api/v1/metrics/browser").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["rendererConfigured"], true);

    state.shutdown().await;
}

#[tokio::test]
async fn task_ttl_only_reaps_terminal_records() {
    // Direct manager check: the sweeper never touches live records.
    let manager = TaskManager::new(Duration::from_millis(10));
    manager.spawn_sweeper(Duration::from_millis(20));

    let id = manager.submit(
        vitae_core::TaskKind::Scrape,
        vitae_core::task::TaskRequest::Scrape {
            url: Some("https://example.com/job/1".into()),
            description: None,
        },
        async {
            Ok(vitae_core::task::TaskResult::Scrape {
                posting: JobPosting::default(),
                engine: "stub".into(),
            })
        },
    );

    // Wait for terminal, then for the sweeper to reap it.
    for _ in 0..200 {
        match manager.status(&id) {
            Some(record) if record.is_terminal() => break,
            _ => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(manager.status(&id).is_none(), "terminal record not reaped");
}
