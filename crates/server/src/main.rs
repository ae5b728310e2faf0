use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cinehub_server::config::ServerConfig;
use cinehub_server::routes::build_router;
use cinehub_server::state::AppState;
use cinehub_streaming::session::{PlaybackSessionManager, SessionConfig};
use cinehub_tmdb::{TmdbAuth, TmdbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();

    let auth = TmdbAuth::from_credentials(
        config.tmdb_read_token.as_deref(),
        config.tmdb_api_key.as_deref(),
    );
    if auth.is_none() {
        warn!("no TMDB credentials set; TMDB-backed routes will answer 503");
    }
    let tmdb = Arc::new(TmdbClient::new(auth));

    let sessions = Arc::new(PlaybackSessionManager::new(SessionConfig::default()));

    // Spawn idle session cleanup task
    {
        let sessions = sessions.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                sessions.cleanup_idle().await;
            }
        });
    }

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        tmdb,
        sessions,
        config: Arc::new(config),
    };

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
