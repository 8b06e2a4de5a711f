use crate::model::{ChatRequest, LlmResponse};
use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
}

pub mod fake;
pub mod http;
pub mod shape;

pub use fake::FakeClient;
pub use http::HttpChatClient;
pub use shape::ResponseShape;
