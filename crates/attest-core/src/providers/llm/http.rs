use super::{LlmClient, ResponseShape};
use crate::config::HarnessConfig;
use crate::model::{ChatRequest, LlmResponse};
use async_trait::async_trait;
use serde_json::json;

/// Chat client for an Ollama/OpenAI-style HTTP endpoint.
pub struct HttpChatClient {
    pub endpoint: String,
    pub client: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self::new(cfg.endpoint.clone())
    }
}

#[async_trait]
impl LlmClient for HttpChatClient {
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("chat API error (status {}): {}", status.as_u16(), error_text);
        }

        let body: serde_json::Value = resp.json().await?;
        let shape = ResponseShape::detect(&body);
        let shape_name = shape.name();
        let text = shape
            .into_text()
            .ok_or_else(|| anyhow::anyhow!("chat API response missing content"))?;

        tracing::debug!(shape = shape_name, chars = text.len(), "chat response");

        Ok(LlmResponse {
            text,
            provider: self.provider_name().to_string(),
            model: request.model.clone(),
            meta: json!({ "shape": shape_name }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}
