use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::stateless_llm_interface::{
    ChatCompletionRequest, ChatCompletionResponse, LlmError, StatelessLLMInterface,
};

/// Upstream error bodies are echoed to clients, so keep them short.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Chat completion client for OpenAI and API-compatible providers.
pub struct OpenAICompatibleLLM {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenAICompatibleLLM {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into();
        let client = Client::builder().timeout(timeout).build()?;
        info!(
            "Initialized OpenAICompatibleLLM: base_url={}, timeout={:?}",
            base_url, timeout
        );
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    async fn chat_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = self.endpoint();
        debug!("POST {} model={}", url, request.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(&url, e))?;
        serde_json::from_slice(&bytes).map_err(|e| LlmError::MalformedBody(e.to_string()))
    }
}
