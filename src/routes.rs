use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::error::TranslateError;
use crate::settings::LanguageOption;
use crate::state::AppState;
use crate::translate::{TranslateRequest, TranslateResponse};

pub fn create_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(health_check))

        // REST API routes
        .route("/api/languages", get(get_languages))
        .route(
            "/api/translate",
            post(translate)
                .options(preflight)
                .fallback(method_not_allowed),
        )

        // Browser client
        .fallback_service(ServeDir::new(&state.config.server.static_dir))
}

/// The full application: routes, CORS, request tracing and state.
pub fn build_app(state: AppState) -> Router {
    create_routes(&state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "credentialConfigured": state.translator.is_configured(),
        "model": state.config.translation.model
    }))
}

async fn get_languages(State(state): State<AppState>) -> Json<Vec<LanguageOption>> {
    Json(state.config.languages.clone())
}

async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, TranslateError> {
    let Json(request) = payload.map_err(|rejection| TranslateError::InvalidBody(rejection.body_text()))?;
    let response = state.translator.translate(request).await?;
    Ok(Json(response))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> TranslateError {
    TranslateError::MethodNotAllowed(method.to_string())
}
