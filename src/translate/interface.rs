use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// Translation request as posted by the browser client. Fields are optional
/// here so that absent ones are reported as missing rather than as a bad body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub input_text: Option<String>,
    /// Older clients post this as `outputLang`.
    #[serde(alias = "outputLang")]
    pub output_lang_code: Option<String>,
    pub language_name: Option<String>,
}

/// A request whose fields are all present and non-blank.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub input_text: String,
    pub output_lang_code: String,
    pub language_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translation: String,
    pub original_text: String,
    pub target_language: String,
    pub success: bool,
}

impl TranslateRequest {
    pub fn validate(self) -> Result<TranslationRequest, TranslateError> {
        let mut missing = Vec::new();
        let input_text = required(self.input_text, "inputText", &mut missing);
        let output_lang_code = required(self.output_lang_code, "outputLangCode", &mut missing);
        let language_name = required(self.language_name, "languageName", &mut missing);

        match (input_text, output_lang_code, language_name) {
            (Some(input_text), Some(output_lang_code), Some(language_name)) => Ok(TranslationRequest {
                input_text,
                output_lang_code,
                language_name,
            }),
            _ => Err(TranslateError::MissingFields(missing)),
        }
    }
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if value.is_none() {
        missing.push(name);
    }
    value
}

impl TranslateResponse {
    pub fn new(translation: String, request: TranslationRequest) -> Self {
        Self {
            translation,
            original_text: request.input_text,
            target_language: request.output_lang_code,
            success: true,
        }
    }
}
