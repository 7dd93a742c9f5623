use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::StatusMapping;

/// Body of every non-success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure of a single translation request. The `Display` text is the stable
/// category clients branch on; diagnostics go to [`TranslateError::details`].
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Method not allowed")]
    MethodNotAllowed(String),

    #[error("Configuration error")]
    NotConfigured(String),

    #[error("Cannot connect to translation service")]
    Unreachable(String),

    #[error("Translation service timed out")]
    Timeout(String),

    #[error("Invalid API key")]
    InvalidApiKey { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimited { status: u16, body: String },

    #[error("Service temporarily unavailable")]
    Unavailable { status: u16, body: String },

    #[error("Translation service error")]
    Upstream { status: u16, body: String },

    #[error("Invalid response from translation service")]
    InvalidResponse(String),

    #[error("Empty translation received")]
    EmptyTranslation,
}

impl TranslateError {
    pub fn from_upstream_status(mapping: StatusMapping, status: u16, body: String) -> Self {
        match (mapping, status) {
            (StatusMapping::Generic, _) => Self::Upstream { status, body },
            (StatusMapping::Detailed, 401) => Self::InvalidApiKey { status, body },
            (StatusMapping::Detailed, 429) => Self::RateLimited { status, body },
            (StatusMapping::Detailed, 500..=599) => Self::Unavailable { status, body },
            (StatusMapping::Detailed, _) => Self::Upstream { status, body },
        }
    }

    pub fn category(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            Self::MissingFields(fields) => Some(format!("Missing: {}", fields.join(", "))),
            Self::MethodNotAllowed(method) => Some(format!("{} is not supported, use POST", method)),
            Self::InvalidBody(msg)
            | Self::NotConfigured(msg)
            | Self::Unreachable(msg)
            | Self::Timeout(msg)
            | Self::InvalidResponse(msg) => Some(msg.clone()),
            Self::InvalidApiKey { status, body }
            | Self::RateLimited { status, body }
            | Self::Unavailable { status, body }
            | Self::Upstream { status, body } => Some(if body.is_empty() {
                format!("Upstream status {}", status)
            } else {
                format!("Upstream status {}: {}", status, body)
            }),
            Self::EmptyTranslation => None,
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.category(),
            details: self.details(),
        }
    }
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_response_body())).into_response()
    }
}
