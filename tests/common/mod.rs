#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use course_tracker::auth::{generate_jwt, Claims};
use course_tracker::config::{ApiConfig, SecurityConfig};
use course_tracker::database::{CourseStore, MemoryStore};
use course_tracker::server::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router served on a free port inside the current test runtime
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn(store: Arc<dyn CourseStore>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let api = ApiConfig {
            port,
            enable_request_logging: false,
            max_request_size_bytes: 64 * 1024,
        };
        let security = SecurityConfig {
            jwt_secret: TEST_SECRET.to_string(),
            jwt_expiry_hours: 1,
            enable_cors: true,
            cors_origins: vec!["http://localhost:5173".to_string()],
        };
        let router = app(AppState::new(store, TEST_SECRET), &api, &security);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST a JSON payload to a named action, returning status and parsed body
    pub async fn action(&self, name: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let mut request = self.client.post(self.url(&format!("/api/actions/{}", name))).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await?;
        Ok((status, body))
    }
}

/// Start a server backed by a fresh in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    TestServer::spawn(Arc::new(MemoryStore::new())).await
}

pub async fn spawn_server_with(store: Arc<dyn CourseStore>) -> Result<TestServer> {
    TestServer::spawn(store).await
}

/// A fresh user id and a valid bearer token for it
pub fn new_user() -> Result<(Uuid, String)> {
    let user_id = Uuid::new_v4();
    let token = generate_jwt(&Claims::new(user_id, Some("tester".to_string()), 1)?, TEST_SECRET)?;
    Ok((user_id, token))
}
