use std::sync::Arc;
use tracing::warn;

use crate::llm::{OpenAICompatibleLLM, StatelessLLMInterface};
use crate::settings::Config;
use crate::translate::Translator;

/// Shared, read-only state. Nothing in here changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Arc<Translator>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let settings = &config.translation;
        let api_key = settings.resolve_api_key();
        if api_key.is_none() {
            warn!(
                "{} is not set; translation requests will fail with a configuration error",
                settings.api_key_env
            );
        }

        let llm = Arc::new(OpenAICompatibleLLM::new(
            settings.base_url.clone(),
            settings.timeout(),
        )?);
        Ok(Self::with_llm(config, api_key, llm))
    }

    pub fn with_llm(
        config: Config,
        api_key: Option<String>,
        llm: Arc<dyn StatelessLLMInterface>,
    ) -> Self {
        let translator = Translator::new(config.translation.clone(), api_key, llm);
        Self {
            config: Arc::new(config),
            translator: Arc::new(translator),
        }
    }
}
