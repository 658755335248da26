use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::app::{router, AppState};
use crate::config::AppConfig;
use crate::database::{MemoryStore, PgStore};

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Council API in {:?} mode", config.environment);

    let (state, pg) = match &config.database.url {
        Some(url) => {
            let pg = PgStore::connect(url, &config.database)
                .await
                .context("failed to connect to database")?;
            pg.ensure_schema().await.context("failed to prepare database schema")?;
            let shared = Arc::new(pg.clone());
            (
                AppState::new(shared.clone(), shared, &config.security.jwt_secret),
                Some(pg),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            let memory = Arc::new(MemoryStore::new());
            (
                AppState::new(memory.clone(), memory, &config.security.jwt_secret),
                None,
            )
        }
    };

    let app = router(state, &config.security);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Council API listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pg) = pg {
        pg.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
