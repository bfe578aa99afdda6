use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;

use estate_advisor::{config::AppConfig, logging, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; advisor replies will fall back to the error message");
    }

    let addr = config.bind_addr;
    let ttl = config.session_ttl;
    let state = Arc::new(AppState::new(config));

    // Idle sessions are swept on a fixed cadence.
    let sweep_every = ttl.clamp(Duration::from_secs(1), Duration::from_secs(300));
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let removed = sweeper.sessions.purge_expired().await;
            if removed > 0 {
                tracing::info!(removed, "purged idle sessions");
            }
        }
    });

    let app = routes::create_router(state).layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("estate advisor running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
