//! TellaTale API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tellatale_api::config::ServerConfig;
use tellatale_api::error::AppError;
use tellatale_api::state::AppState;
use tellatale_api::telemetry;
use tellatale_gemini::GeminiClient;
use tellatale_story::application::generator::StoryGenerator;
use tellatale_story::application::model_resolution::FallbackModelResolver;
use tellatale_story::domain::prompt::PromptComposer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();

    // Read configuration from environment.
    let config = ServerConfig::from_env()?;

    // Initialize tracing subscriber.
    let tracer_provider = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting TellaTale API server");
    if config.generator.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; story requests will fail fast");
    }

    // Build application state.
    let backend = Arc::new(GeminiClient::new(config.gemini.clone()));
    let resolver = Arc::new(FallbackModelResolver::new(
        config.preferred_model.clone(),
        config.default_model.clone(),
    ));
    let generator = StoryGenerator::new(config.generator.clone(), backend, resolver);
    let app_state = AppState::new(generator, PromptComposer::new(config.language));

    // Build router.
    // TODO: Replace CorsLayer::permissive() with the deployed page's origin.
    let app = tellatale_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = tracer_provider.map_or(Ok(()), |provider| provider.shutdown()) {
        eprintln!("failed to flush trace exporter: {e}");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
