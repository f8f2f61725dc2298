use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use scribe::application::ports::TranscriptionEngine;
use scribe::infrastructure::audio::{CandleWhisperEngine, OpenAiWhisperEngine};
use scribe::infrastructure::observability::{TracingConfig, init_tracing};
use scribe::presentation::{
    AppState, Environment, Settings, TranscriptionProviderSetting, build_cors_layer,
    create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&TracingConfig::from_settings(&settings.logging, environment));

    match settings.transcription.provider {
        TranscriptionProviderSetting::Local => {
            serve(settings, CandleWhisperEngine::new()).await
        }
        TranscriptionProviderSetting::OpenAi => {
            let openai = &settings.transcription.openai;
            if openai.api_key.is_empty() {
                anyhow::bail!("transcription.openai.api_key is required for the openai provider");
            }
            let engine = OpenAiWhisperEngine::new(
                openai.api_key.clone(),
                Some(openai.base_url.clone()),
                Some(openai.model.clone()),
            );
            serve(settings, engine).await
        }
    }
}

async fn serve<E: TranscriptionEngine>(settings: Settings, engine: E) -> anyhow::Result<()> {
    let cors = build_cors_layer(&settings.cors).context("Invalid CORS settings")?;
    let addr = settings.bind_address();
    let provider = settings.transcription.provider;

    let state = AppState::new(Arc::new(engine), settings);
    let router = create_router(state, cors);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(address = %addr, provider = ?provider, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
