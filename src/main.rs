//! Entry point: loads the settings, opens the store and serves the API

use std::{net::SocketAddr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use careportal::authorization::Enforcer;
use careportal::backend::{router::get_router, AppState};
use careportal::chatbot::{Chatbot, GeminiGenerator, GoogleTranslator};
use careportal::config::Settings;
use careportal::db::Store;
use careportal::risk::{ModelHandle, RiskScorer};
use careportal::services::Service;

fn chatbot(settings: &Settings) -> Result<Chatbot> {
    let chat = &settings.chatbot;

    let translate_key = chat.translate_api_key.clone().unwrap_or_else(|| {
        warn!("TRANSLATE_API_KEY is not set, chatbot requests will be refused upstream");
        String::new()
    });
    let genai_key = chat.genai_api_key.clone().unwrap_or_else(|| {
        warn!("GENAI_API_KEY is not set, chatbot requests will be refused upstream");
        String::new()
    });

    Ok(Chatbot::new(
        Box::new(GoogleTranslator::new(chat.translate_url.clone(), translate_key, chat.timeout)?),
        Box::new(GeminiGenerator::new(&chat.genai_url, &chat.genai_model, genai_key, chat.timeout)?),
        chat.local_language.clone(),
        chat.remote_language.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;

    let store = Store::open(settings.db_path.clone())
        .await
        .with_context(|| format!("Cannot open {}", settings.db_path.display()))?;
    let enforcer = Enforcer::load()
        .await
        .map_err(|e| anyhow!("Cannot load the access policy: {e}"))?;
    let risk = RiskScorer::new(
        ModelHandle::lazy(settings.model_path.clone()),
        settings.prediction_mode,
    );
    match risk.warm_up() {
        Ok(()) => info!(
            "Risk scores reported as {} from {}",
            settings.prediction_mode,
            settings.model_path.display()
        ),
        Err(e) => warn!("Risk model not loaded, retrying on first use: {e}"),
    }

    let state = Arc::new(AppState {
        service: Service::new(Arc::new(store), enforcer, risk),
        chatbot: chatbot(&settings)?,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.http_port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to open web server listener")?;

    axum::serve(listener, get_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("Cannot listen for ctrl-c, shutting down");
            }
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
