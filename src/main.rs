use goal_tracker::{router, AppState, Config, FileStore, GoalTracker, RemoteClient, SyncShim};
use std::net::SocketAddr;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = FileStore::open(&config.data_path);
    let sync = match &config.remote_url {
        Some(url) => {
            info!("mirroring writes to {url}");
            SyncShim::new(RemoteClient::new(url.as_str())?)
        }
        None => {
            warn!("REMOTE_API_URL not set, remote sync disabled");
            SyncShim::disabled()
        }
    };
    sync.probe();

    let state = AppState::new(GoalTracker::new(Box::new(store), sync));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(data_path = %config.data_path.display(), "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
