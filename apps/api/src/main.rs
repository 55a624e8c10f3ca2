//! # Ruedas API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POS front-end ───► HTTP (5000) ───► routes ───► SQLite                 │
//! │        ▲                                │                               │
//! │        └──────────── /ws ◄──── NotificationHub                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ruedas_api::{router, ApiConfig, AppState};
use ruedas_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::load()?;
    init_tracing(config.debug);

    info!("Starting Ruedas API server...");
    info!(
        database = %config.database_path,
        tax_rate_bps = config.tax_rate_bps,
        credit_term_days = config.credit_term_days,
        "Configuration loaded"
    );

    if config.uses_default_secret() {
        warn!("SECRET_KEY not set, signing tokens with the default key");
    }

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Database ready");

    let addr = config.bind_address()?;
    let app = router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise info for our crates and request spans.
fn init_tracing(debug: bool) {
    let default = if debug {
        "ruedas_api=debug,ruedas_db=debug,tower_http=debug"
    } else {
        "ruedas_api=info,ruedas_db=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
