use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cumulo_schema::{AssistantReply, ConversationTurn};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::AssistantConfig;

/// API version pinned against the hosted engine.
const API_VERSION: &str = "2018-02-16";

/// The hosted conversational-intent engine, treated as an opaque box: text
/// and context in, ranked intents plus output text and a (possibly mutated)
/// context out.
#[async_trait]
pub trait IntentEngine: Send + Sync {
    async fn message(&self, turn: ConversationTurn) -> Result<AssistantReply>;
}

#[derive(Debug, Clone)]
pub struct AssistantHttpClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    workspace_id: String,
}

impl AssistantHttpClient {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            workspace_id: config.workspace_id.clone(),
        }
    }
}

#[async_trait]
impl IntentEngine for AssistantHttpClient {
    async fn message(&self, turn: ConversationTurn) -> Result<AssistantReply> {
        let url = format!(
            "{}/v1/workspaces/{}/message?version={API_VERSION}",
            self.base_url, self.workspace_id
        );

        let resp = match self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&turn)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(anyhow!("intent engine timed out after 30s"));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await?;
            let parsed = serde_json::from_str::<ApiError>(&text).ok();
            return Err(match parsed {
                Some(err) => anyhow!("intent engine returned {status}: {}", err.error),
                None => anyhow!("intent engine returned {status}: {text}"),
            });
        }

        Ok(resp.json::<AssistantReply>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}
