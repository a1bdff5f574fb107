use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_ASSISTANT_URL: &str = "https://gateway.watsonplatform.net/assistant/api";
const DEFAULT_WEATHER_URL: &str = "https://twcservice.mybluemix.net/api/weather";
const DEFAULT_FOLLOWUP_DELAY_MS: u64 = 5000;

/// Credentials and workspace for the hosted intent engine.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub username: String,
    pub password: String,
    pub workspace_id: String,
    pub base_url: String,
}

/// Basic credentials for the weather endpoints.
#[derive(Debug, Clone)]
pub struct WeatherApiConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub assistant: AssistantConfig,
    pub weather: WeatherApiConfig,
    /// Fixed wait before the weather follow-up is emitted, so the client
    /// renders the conversational text first. Sequencing, not backoff.
    pub followup_delay: Duration,
}

impl GatewayConfig {
    /// Reads the configuration surface from the environment. Base URLs and
    /// the follow-up delay have defaults; credentials do not.
    pub fn from_env() -> Result<Self> {
        let followup_ms = match std::env::var("CUMULO_FOLLOWUP_DELAY_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("CUMULO_FOLLOWUP_DELAY_MS is not an integer")?,
            Err(_) => DEFAULT_FOLLOWUP_DELAY_MS,
        };

        Ok(Self {
            assistant: AssistantConfig {
                username: require_env("ASSISTANT_API_USERNAME")?,
                password: require_env("ASSISTANT_API_PASSWORD")?,
                workspace_id: require_env("ASSISTANT_WORKSPACE_ID")?,
                base_url: std::env::var("ASSISTANT_API_URL")
                    .unwrap_or_else(|_| DEFAULT_ASSISTANT_URL.to_string()),
            },
            weather: WeatherApiConfig {
                username: require_env("WEATHER_API_USERNAME")?,
                password: require_env("WEATHER_API_PASSWORD")?,
                base_url: std::env::var("WEATHER_API_URL")
                    .unwrap_or_else(|_| DEFAULT_WEATHER_URL.to_string()),
            },
            followup_delay: Duration::from_millis(followup_ms),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing environment variable {name}"))
}
