use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::interface::{TranslateRequest, TranslateResponse};
use super::prompt::build_messages;
use crate::error::TranslateError;
use crate::llm::{ChatCompletionRequest, ChatCompletionResponse, LlmError, StatelessLLMInterface};
use crate::settings::TranslationConfig;

/// The translation request handler. Stateless: every call validates, sends
/// exactly one upstream request and reports the outcome.
pub struct Translator {
    settings: TranslationConfig,
    api_key: Option<String>,
    llm: Arc<dyn StatelessLLMInterface>,
}

impl Translator {
    pub fn new(
        settings: TranslationConfig,
        api_key: Option<String>,
        llm: Arc<dyn StatelessLLMInterface>,
    ) -> Self {
        Self {
            settings,
            api_key,
            llm,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse, TranslateError> {
        let request = request.validate()?;
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            TranslateError::NotConfigured(format!("{} is not set", self.settings.api_key_env))
        })?;

        let request_id = Uuid::new_v4();
        info!(
            "Translation {}: {} chars to {} ({}) via {}",
            request_id,
            request.input_text.chars().count(),
            request.language_name,
            request.output_lang_code,
            self.settings.model
        );

        let completion = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: build_messages(self.settings.system_prompt.as_deref(), &request),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
            presence_penalty: self.settings.presence_penalty,
        };

        let response = self
            .llm
            .chat_completion(api_key, &completion)
            .await
            .map_err(|e| {
                warn!("Translation {} failed upstream: {}", request_id, e);
                self.map_llm_error(e)
            })?;

        let translation = extract_translation(response).map_err(|e| {
            warn!("Translation {} rejected: {}", request_id, e);
            e
        })?;
        debug!("Translation {} done: {} chars", request_id, translation.chars().count());

        Ok(TranslateResponse::new(translation, request))
    }

    fn map_llm_error(&self, err: LlmError) -> TranslateError {
        match err {
            LlmError::Transport { .. } => TranslateError::Unreachable(err.to_string()),
            LlmError::Timeout(_) => TranslateError::Timeout(err.to_string()),
            LlmError::Status { status, body } => {
                TranslateError::from_upstream_status(self.settings.status_mapping, status, body)
            }
            LlmError::MalformedBody(msg) => TranslateError::InvalidResponse(msg),
        }
    }
}

fn extract_translation(response: ChatCompletionResponse) -> Result<String, TranslateError> {
    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| TranslateError::InvalidResponse("response has no choices".to_string()))?;
    let message = choice
        .message
        .ok_or_else(|| TranslateError::InvalidResponse("first choice has no message".to_string()))?;

    let text = message.content.unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Err(TranslateError::EmptyTranslation);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::FakeLLM;
    use crate::settings::StatusMapping;
    use serde_json::json;
    use std::time::Duration;

    fn translator(llm: Arc<FakeLLM>) -> Translator {
        Translator::new(TranslationConfig::default(), Some("sk-test".to_string()), llm)
    }

    fn valid_request() -> TranslateRequest {
        TranslateRequest {
            input_text: Some("Hello".to_string()),
            output_lang_code: Some("es".to_string()),
            language_name: Some("Spanish".to_string()),
        }
    }

    fn status_error(status: u16) -> LlmError {
        LlmError::Status {
            status,
            body: "upstream said no".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_translation_is_trimmed() {
        let llm = Arc::new(FakeLLM::replying("  Hola \n"));
        let response = translator(llm.clone()).translate(valid_request()).await.unwrap();

        assert_eq!(response.translation, "Hola");
        assert_eq!(response.original_text, "Hello");
        assert_eq!(response.target_language, "es");
        assert!(response.success);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_request_uses_settings_and_prompt() {
        let llm = Arc::new(FakeLLM::replying("Hola"));
        let settings = TranslationConfig {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 200,
            top_p: Some(1.0),
            ..TranslationConfig::default()
        };
        let translator = Translator::new(settings, Some("sk-live".to_string()), llm.clone());
        translator.translate(valid_request()).await.unwrap();

        let (api_key, sent) = llm.last_call().unwrap();
        assert_eq!(api_key, "sk-live");
        assert_eq!(sent.model, "gpt-4o-mini");
        assert_eq!(sent.temperature, 0.3);
        assert_eq!(sent.max_tokens, 200);
        assert_eq!(sent.top_p, Some(1.0));
        assert_eq!(sent.frequency_penalty, None);
        assert_eq!(sent.messages[0].role, "system");
        assert_eq!(sent.messages[1].content, "Translate this medical phrase to Spanish: \"Hello\"");
    }

    #[tokio::test]
    async fn test_missing_fields_never_reach_upstream() {
        let llm = Arc::new(FakeLLM::replying("Hola"));
        let translator = translator(llm.clone());

        let variants = [
            TranslateRequest { input_text: None, ..valid_request() },
            TranslateRequest { output_lang_code: Some(String::new()), ..valid_request() },
            TranslateRequest { language_name: None, ..valid_request() },
            TranslateRequest::default(),
        ];
        for request in variants {
            let err = translator.translate(request).await.unwrap_err();
            assert_eq!(err.category(), "Missing required fields");
            assert_eq!(err.status().as_u16(), 400);
        }
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let llm = Arc::new(FakeLLM::replying("Hola"));
        let translator = Translator::new(TranslationConfig::default(), None, llm.clone());

        let err = translator.translate(valid_request()).await.unwrap_err();
        assert_eq!(err.category(), "Configuration error");
        assert_eq!(err.status().as_u16(), 500);
        assert!(err.details().unwrap().contains("OPENAI_API_KEY"));
        assert!(!translator.is_configured());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_field_check_precedes_credential_check() {
        let translator = Translator::new(
            TranslationConfig::default(),
            None,
            Arc::new(FakeLLM::replying("Hola")),
        );
        let err = translator.translate(TranslateRequest::default()).await.unwrap_err();
        assert_eq!(err.category(), "Missing required fields");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_invalid_api_key() {
        let translator = translator(Arc::new(FakeLLM::failing(status_error(401))));
        let err = translator.translate(valid_request()).await.unwrap_err();
        assert_eq!(err.category(), "Invalid API key");
        assert_eq!(err.status().as_u16(), 500);
        assert!(err.details().unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_rate_limit_and_outage_categories() {
        let err = translator(Arc::new(FakeLLM::failing(status_error(429))))
            .translate(valid_request())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "Rate limit exceeded");

        let err = translator(Arc::new(FakeLLM::failing(status_error(503))))
            .translate(valid_request())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "Service temporarily unavailable");
        assert!(err.details().unwrap().contains("503"));

        let err = translator(Arc::new(FakeLLM::failing(status_error(400))))
            .translate(valid_request())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "Translation service error");
    }

    #[tokio::test]
    async fn test_generic_status_mapping() {
        let settings = TranslationConfig {
            status_mapping: StatusMapping::Generic,
            ..TranslationConfig::default()
        };
        let translator = Translator::new(
            settings,
            Some("sk-test".to_string()),
            Arc::new(FakeLLM::failing(status_error(401))),
        );
        let err = translator.translate(valid_request()).await.unwrap_err();
        assert_eq!(err.category(), "Translation service error");
        assert!(err.details().unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let llm = FakeLLM::failing(LlmError::Transport {
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            message: "dns error".to_string(),
        });
        let err = translator(Arc::new(llm)).translate(valid_request()).await.unwrap_err();
        assert_eq!(err.category(), "Cannot connect to translation service");
        assert!(err.details().unwrap().contains("dns error"));
    }

    #[tokio::test]
    async fn test_timeout_has_its_own_category() {
        let llm = FakeLLM::failing(LlmError::Timeout(Duration::from_secs(30)));
        let err = translator(Arc::new(llm)).translate(valid_request()).await.unwrap_err();
        assert_eq!(err.category(), "Translation service timed out");
        assert_eq!(err.status().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_whitespace_content_is_empty_translation() {
        for body in [
            json!({"choices": [{"message": {"content": "   \n"}}]}),
            json!({"choices": [{"message": {"content": null}}]}),
            json!({"choices": [{"message": {"role": "assistant"}}]}),
        ] {
            let err = translator(Arc::new(FakeLLM::with_body(body)))
                .translate(valid_request())
                .await
                .unwrap_err();
            assert_eq!(err.category(), "Empty translation received");
        }
    }

    #[tokio::test]
    async fn test_incomplete_structure_is_invalid_response() {
        for body in [
            json!({"id": "cmpl-1"}),
            json!({"choices": []}),
            json!({"choices": [{"index": 0}]}),
        ] {
            let err = translator(Arc::new(FakeLLM::with_body(body)))
                .translate(valid_request())
                .await
                .unwrap_err();
            assert_eq!(err.category(), "Invalid response from translation service");
        }

        let llm = FakeLLM::failing(LlmError::MalformedBody("expected value".to_string()));
        let err = translator(Arc::new(llm)).translate(valid_request()).await.unwrap_err();
        assert_eq!(err.category(), "Invalid response from translation service");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_not_cached() {
        let llm = Arc::new(FakeLLM::replying("Hola"));
        let translator = translator(llm.clone());

        let first = translator.translate(valid_request()).await.unwrap();
        let second = translator.translate(valid_request()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(llm.calls(), 2);
    }
}
