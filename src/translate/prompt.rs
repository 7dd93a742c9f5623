use crate::llm::ChatMessage;

use super::interface::TranslationRequest;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional medical translator. \
Provide accurate, contextually appropriate translations for medical terminology and phrases. \
Return only the translation, with no explanation, notes or quotation marks.";

pub fn user_prompt(language_name: &str, input_text: &str) -> String {
    format!(
        "Translate this medical phrase to {}: \"{}\"",
        language_name, input_text
    )
}

/// System persona followed by the phrase to translate.
pub fn build_messages(system_prompt: Option<&str>, request: &TranslationRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT)),
        ChatMessage::user(user_prompt(&request.language_name, &request.input_text)),
    ]
}
