//! Main Entrypoint for the Silver-Line API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the speech synthesis and recognition backends.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use silverline_api::{
    config::Config,
    router::create_router,
    state::AppState,
    tts::{CachingSynthesizer, OpenAISynthesizer},
    ws::provider::openai::OpenAIRealtimeTranscriber,
};
use silverline_core::{
    interview::Disposition,
    questions::QUESTIONS,
    sink::LogSink,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Speech Backends ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(&config.openai_api_key)
        .with_api_base("https://api.openai.com/v1");

    let synthesizer = Arc::new(CachingSynthesizer::new(OpenAISynthesizer::new(
        openai_config,
        &config.tts_model,
        &config.tts_voice,
    )?));
    let closing_lines = [Disposition::Escalate.message(), Disposition::Close.message()];
    if let Err(e) = synthesizer
        .warm(QUESTIONS.iter().copied().chain(closing_lines))
        .await
    {
        warn!(error = ?e, "Could not pre-synthesize prompts; they will be synthesized on first use.");
    }

    let transcriber = Arc::new(OpenAIRealtimeTranscriber::new(
        config.openai_api_key.clone(),
        config.realtime_model.clone(),
        config.transcription_model.clone(),
    ));

    let app_state = Arc::new(AppState {
        config: Arc::new(config.clone()),
        synthesizer,
        transcriber,
        sink: Arc::new(LogSink),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 5. Start Server ---
    info!(
        tts_model = %config.tts_model,
        realtime_model = %config.realtime_model,
        escalation_threshold = config.escalation_threshold,
        stream_url = %config.stream_url(),
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
