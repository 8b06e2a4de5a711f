use super::LlmClient;
use crate::model::{ChatRequest, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    Error(String),
    /// Sleeps before answering; used to exercise timeouts.
    Delayed(Duration, String),
}

/// Replays scripted replies in order. Once the script runs out every call fails.
pub struct FakeClient {
    replies: Mutex<VecDeque<FakeReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeClient {
    pub fn new(replies: impl IntoIterator<Item = FakeReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| FakeReply::Text(t.into())))
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();

        let text = match next {
            Some(FakeReply::Text(t)) => t,
            Some(FakeReply::Error(e)) => anyhow::bail!("{}", e),
            Some(FakeReply::Delayed(d, t)) => {
                tokio::time::sleep(d).await;
                t
            }
            None => anyhow::bail!("fake client: no scripted reply left"),
        };

        Ok(LlmResponse {
            text,
            provider: self.provider_name().to_string(),
            model: request.model.clone(),
            meta: serde_json::Value::Null,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
