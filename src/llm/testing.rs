use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::stateless_llm_interface::{
    ChatCompletionRequest, ChatCompletionResponse, LlmError, StatelessLLMInterface,
};

/// Scripted backend that answers every call the same way and records what it was sent.
pub struct FakeLLM {
    reply: Result<ChatCompletionResponse, LlmError>,
    calls: AtomicUsize,
    last: Mutex<Option<(String, ChatCompletionRequest)>>,
}

impl FakeLLM {
    pub fn replying(content: &str) -> Self {
        Self::with_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    pub fn with_body(body: serde_json::Value) -> Self {
        let response = serde_json::from_value(body).expect("fake body must parse");
        Self::new(Ok(response))
    }

    pub fn failing(err: LlmError) -> Self {
        Self::new(Err(err))
    }

    fn new(reply: Result<ChatCompletionResponse, LlmError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, ChatCompletionRequest)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatelessLLMInterface for FakeLLM {
    async fn chat_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((api_key.to_string(), request.clone()));
        self.reply.clone()
    }
}
