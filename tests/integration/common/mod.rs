//! Common test utilities and fixtures for integration tests
//!
//! - Test application over the in-memory store and mock provider
//! - JWT minting
//! - Request builders and SSE body parsing

use std::sync::Arc;

use alloychat_auth::{AccessClaims, AuthRole};
use alloychat_common::Config;
use alloychat_conversations::InMemoryConversationStore;
use alloychat_llm::MockLlmService;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only"; // pragma: allowlist secret

/// Configuration used by every test app
pub fn test_config() -> Config {
    Config {
        database_url: "postgresql://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_issuer: None,
        jwt_audience: None,
        llm_provider: "mock".to_string(),
        anthropic_api_key: None,
        llm_base_url: None,
        llm_model: "mock-model".to_string(),
        llm_max_tokens: 256,
        llm_temperature: 0.2,
        heartbeat_interval_secs: 15,
        context_window: 10,
        log_format: "pretty".to_string(),
        port: 0,
    }
}

/// Test application: full router over in-memory collaborators
pub struct TestApp {
    pub store: InMemoryConversationStore,
    pub llm: Arc<MockLlmService>,
    pub config: Config,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_llm(MockLlmService::new())
    }

    pub fn with_llm(llm: MockLlmService) -> Self {
        Self {
            store: InMemoryConversationStore::new(),
            llm: Arc::new(llm),
            config: test_config(),
        }
    }

    /// Fresh router sharing this app's store and provider
    pub fn router(&self) -> Router {
        alloychat_app::create_app(
            &self.config,
            Arc::new(self.store.clone()),
            self.llm.clone(),
        )
    }

    /// Bearer token for `user_id`
    pub fn jwt_for(&self, user_id: Uuid) -> String {
        create_test_jwt(user_id, &self.config.jwt_secret)
    }
}

/// Mint an HS256 access token valid for one hour
pub fn create_test_jwt(user_id: Uuid, secret: &str) -> String {
    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp() as u64;
    let claims = AccessClaims {
        sub: user_id.to_string(),
        email: Some(format!("test_{}@alloychat.test", user_id.simple())),
        role: AuthRole::User,
        iat: now,
        exp: now + 3600,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .unwrap()
}

/// Build an authenticated request
pub fn authed_request(method: Method, uri: &str, jwt: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", jwt));

    match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// One server-sent event as seen on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum SseItem {
    Data(Value),
    Comment(String),
}

/// Read a whole SSE body and split it into events
pub async fn read_sse(response: Response<Body>) -> Vec<SseItem> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    text.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let data: Vec<&str> = block
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            if data.is_empty() {
                let comment = block.trim_start_matches(':').trim().to_string();
                SseItem::Comment(comment)
            } else {
                SseItem::Data(serde_json::from_str(&data.join("\n")).unwrap())
            }
        })
        .collect()
}

/// Concatenated `chunk` payloads, in emission order
pub fn chunk_text(items: &[SseItem]) -> String {
    items
        .iter()
        .filter_map(|item| match item {
            SseItem::Data(v) => v["chunk"].as_str().map(str::to_string),
            SseItem::Comment(_) => None,
        })
        .collect()
}

/// JSON payloads only, keep-alives dropped
pub fn data_events(items: &[SseItem]) -> Vec<Value> {
    items
        .iter()
        .filter_map(|item| match item {
            SseItem::Data(v) => Some(v.clone()),
            SseItem::Comment(_) => None,
        })
        .collect()
}
