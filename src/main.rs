use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campus_push_service::config::Settings;
use campus_push_service::directory::PgDeviceDirectory;
use campus_push_service::postgres::PostgresPool;
use campus_push_service::push::{FcmTransport, PushTransport};
use campus_push_service::server::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing();

    // Load configuration
    let settings = Settings::new()?;
    tracing::info!("Configuration loaded");

    // Connect to the recipient directory
    let postgres = PostgresPool::new(&settings.database).await?;
    tracing::info!(url = %postgres.database_url_masked(), "Connected to PostgreSQL");

    // Push transport; a missing key file is reported per dispatch call, so
    // startup only warns
    let transport = Arc::new(FcmTransport::new(&settings.push));
    if let Err(e) = transport.ensure_ready().await {
        tracing::warn!(
            error = %e,
            "Push credentials unavailable at startup, dispatch calls will fail until the key file is in place"
        );
    }

    // Create application state
    let directory = Arc::new(PgDeviceDirectory::new(postgres.pool().clone()));
    let state = AppState::new(settings.clone(), directory, transport);
    tracing::info!("Application state initialized");

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    postgres.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
