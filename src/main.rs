mod error;
mod llm;
mod routes;
mod settings;
mod state;
mod translate;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medtranslate_backend=debug,tower_http=debug")),
        )
        .init();

    let config = Config::load_default()?;
    info!(
        "Translation model: {} (temperature={}, max_tokens={}, timeout={}s)",
        config.translation.model,
        config.translation.temperature,
        config.translation.max_tokens,
        config.translation.timeout_secs
    );

    let server = config.server.clone();
    let app_state = AppState::new(config)?;
    let app = routes::build_app(app_state);

    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port)).await?;
    info!("Starting server on {}", listener.local_addr()?);
    info!("Serving browser client from {}", server.static_dir);

    axum::serve(listener, app).await?;

    Ok(())
}
