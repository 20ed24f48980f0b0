mod background;
mod config;
mod constants;
mod handlers;
mod models;
mod normalize;
mod server;
mod state;
mod upstream;
mod util;


use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::background::{run_score_cache_updater, run_subscriber_metrics};
use crate::config::{read_env_first, Config};
use crate::constants::DEFAULT_STATIC_DIR;
use crate::server::build_router;
use crate::state::AppState;
use crate::upstream::ScoreApiClient;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "score_stream=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let upstream = ScoreApiClient::new(
        config.score_api_url.clone(),
        config.score_api_token.clone(),
        config.request_timeout,
    )?;
    let score_stream_url = read_env_first(&["PUBLIC_SCORE_STREAM_URL"])
        .unwrap_or_else(|| "/api/score-stream".to_string());
    let state = AppState::new(config.clone(), upstream, score_stream_url);

    let disable_background = env::var("DISABLE_BACKGROUND_TASKS")
        .map(|value| {
            let trimmed = value.trim();
            !trimmed.is_empty() && trimmed != "0"
        })
        .unwrap_or(false);

    if disable_background {
        warn!("background tasks disabled via DISABLE_BACKGROUND_TASKS");
    } else {
        tokio::spawn(run_score_cache_updater(Arc::clone(&state)));
        tokio::spawn(run_subscriber_metrics(Arc::clone(&state)));
    }

    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());

    let app = build_router(Arc::clone(&state), static_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("score-stream listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(Arc::clone(&state)))
    .await
    .context("server error")?;

    Ok(())
}

async fn shutdown_signal(state: Arc<AppState>) {
    #[cfg(unix)]
    {
        let ctrl_c = tokio::signal::ctrl_c();
        let terminate = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!(?err, "failed to install SIGTERM handler");
                None
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = async {
                if let Some(mut signal) = terminate {
                    signal.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    state.broadcast_shutdown();
}
