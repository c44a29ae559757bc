use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{error, info, warn};

use reading_list_api::{
    AppState, Config,
    router::build_router,
    store::{DocumentStore, MemoryStore, PgDocumentStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reading_list_api=debug,sqlx=warn".into()),
        )
        .json()
        .init();

    info!("Starting reading list API v{}", env!("CARGO_PKG_VERSION"));

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            let db = connect_with_retry(database_url)
                .await
                .map_err(|e| anyhow!("Failed to connect to PostgreSQL after retries: {e}"))?;

            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .map_err(|e| anyhow!("Migration failed: {e}"))?;
            info!("Database migrations completed successfully");

            Arc::new(PgDocumentStore::new(db))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-process store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState::new(store, config.clone()));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!("Server error: {e}"))?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn connect_with_retry(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut delay = Duration::from_millis(500);
    let max_attempts = 30;
    let mut attempt = 1;

    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!("Connected to PostgreSQL on attempt {attempt}");
                return Ok(pool);
            }
            Err(e) if attempt >= max_attempts => {
                error!("All connection attempts failed");
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Database connection failed (attempt {}/{}): {e}, retrying in {:?}",
                    attempt, max_attempts, delay
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(5));
                attempt += 1;
            }
        }
    }
}

// Graceful shutdown on Ctrl+C (SIGINT) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
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
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }

    info!("Shutdown signal received, closing server...");
}
