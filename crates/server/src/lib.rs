//! HTTP front end for the odometer and document flows.

pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::path::PathBuf;

use anyhow::Context;
use odoscan_core::AppConfig;
use tracing::info;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ODOSCAN_CONFIG";

/// `<config dir>/odoscan/config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "odoscan", "odoscan").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Explicit path first, then `ODOSCAN_CONFIG`, then the platform default.
/// A missing default file means built-in defaults; a missing explicit file
/// is an error.
pub fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let explicit = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match explicit {
        Some(path) => AppConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None => match default_config_path() {
            Some(path) => {
                AppConfig::load_or_default(&path).with_context(|| format!("loading {}", path.display()))
            }
            None => Ok(AppConfig::default()),
        },
    }
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.server.bind_addr()?;
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "odoscan server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("odoscan server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
