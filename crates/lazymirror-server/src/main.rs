//! lazymirror server.
//!
//! Serves the store directory, fills misses from the configured origin, and
//! keeps a persisted total of bytes sent. Config path: first argument, default
//! `lazymirror.yaml`.

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use lazymirror_core::error::{MirrorError, Result};
use lazymirror_server::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "lazymirror.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "lazymirror exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&cfg_path)?;
    let listen = cfg.listen_addr()?;

    let (state, persist) = app_state::AppState::new(cfg)?;
    tracing::info!(
        %listen,
        origin = %state.cfg().origin.base_url,
        store = %state.cfg().store.root.display(),
        total_bytes_sent = state.traffic().snapshot().total_bytes_sent,
        "lazymirror starting"
    );
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MirrorError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MirrorError::Internal(format!("server failed: {e}")))?;

    // router and its accountant handles are gone; drain pending increments
    persist.finish().await;
    tracing::info!("lazymirror stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
