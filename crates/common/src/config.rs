//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,
    pub database_max_connections: u32,

    /// JWT verification
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Completion provider
    pub llm_provider: String,
    pub anthropic_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,

    /// Chat relay tuning
    pub heartbeat_interval_secs: u64,
    pub context_window: i64,

    /// Runtime configuration
    pub log_format: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let llm_provider = env::var("LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_string());
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").ok();
        if llm_provider == "anthropic" && anthropic_api_key.is_none() {
            return Err(anyhow::anyhow!(
                "ANTHROPIC_API_KEY is required when LLM_PROVIDER=anthropic"
            ));
        }

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            llm_provider,
            anthropic_api_key,
            llm_base_url: env::var("LLM_BASE_URL").ok(),
            llm_model: env::var("LLM_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5-20250929".to_string()),
            llm_max_tokens: parse_or("LLM_MAX_TOKENS", 1024),
            llm_temperature: parse_or("LLM_TEMPERATURE", 0.7),

            heartbeat_interval_secs: parse_or("HEARTBEAT_INTERVAL_SECS", 15).max(1),
            context_window: parse_or("CONTEXT_WINDOW", 10),

            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            port: parse_or("PORT", 3000),
        };

        Ok(config)
    }
}

/// Parse an optional variable, falling back to `default` when unset or malformed
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
