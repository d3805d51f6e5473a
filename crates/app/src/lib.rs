//! Alloychat application composition root
//!
//! Wires the store, the completion provider and the auth backend into the
//! Conversations router.

use std::sync::Arc;
use std::time::Duration;

use alloychat_auth::{AuthBackend, AuthConfig};
use alloychat_common::Config;
use alloychat_conversations::{
    ConversationStore, ConversationsState, DomainGate, RelaySettings, StreamRelay,
};
use alloychat_llm::{CompletionClient, CompletionOptions, LlmConfig, LlmService};
use axum::Router;

/// Provider configuration derived from the process config
pub fn llm_config(config: &Config) -> LlmConfig {
    LlmConfig {
        provider: config.llm_provider.clone(),
        api_key: config.anthropic_api_key.clone().unwrap_or_default(),
        base_url: config.llm_base_url.clone(),
        default_model: config.llm_model.clone(),
        max_tokens: config.llm_max_tokens,
        temperature: config.llm_temperature,
    }
}

/// Relay tuning derived from the process config
pub fn relay_settings(config: &Config) -> RelaySettings {
    RelaySettings {
        heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs.max(1)),
        context_window: config.context_window,
        options: CompletionOptions {
            model: Some(config.llm_model.clone()),
            max_tokens: Some(config.llm_max_tokens),
            temperature: Some(config.llm_temperature),
        },
    }
}

/// Create the main application router with all routes
pub fn create_app(
    config: &Config,
    store: Arc<dyn ConversationStore>,
    llm: Arc<dyn LlmService>,
) -> Router {
    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let relay = StreamRelay::new(
        store,
        CompletionClient::new(llm),
        DomainGate::default(),
        relay_settings(config),
    );

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(alloychat_conversations::routes().with_state(ConversationsState::new(relay, auth)))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
