//! brandforge HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8080)
//! - `BRAND_STORE` - "memory" (default), "sqlite" or "postgres"
//! - `SQLITE_PATH` - SQLite file (default: data/brandforge.db)
//! - `DATABASE_URL` - PostgreSQL connection string (required if BRAND_STORE=postgres)
//! - `GEMINI_API_KEY` - Generative service key (or GOOGLE_GENERATIVE_AI_API_KEY / GOOGLE_API_KEY)
//! - `SELFREPAIR_LOG` - JSON file mirroring the diagnostic history
//! - `RUST_LOG` - Tracing filter (default: "info,brandforge=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! # or with postgres:
//! BRAND_STORE=postgres cargo run --bin server --features postgres
//! ```

use std::sync::Arc;

use anyhow::Context;
use brandforge::config::{AppConfig, StoreBackend};
use brandforge::llms::{GeminiClient, TextGenerator};
use brandforge::server::{app_router, AppState};
use brandforge::store::{BrandStore, MemoryBrandStore, SqliteBrandStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,brandforge=debug".into()),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store = open_store(&config.store).await?;
    let gemini = GeminiClient::new(config.gemini.clone()).context("failed to build Gemini client")?;
    if !gemini.has_api_key() {
        tracing::warn!("No Gemini API key configured; generation requests will fail with an auth error");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(gemini);

    let state = AppState::new(store, generator, &config);
    let app = app_router(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("brandforge server starting on {}", bind_addr);
    tracing::info!("Models: fast={} quality={}", config.models.fast, config.models.quality);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    tracing::info!("brandforge server stopped");
    Ok(())
}

async fn open_store(backend: &StoreBackend) -> anyhow::Result<Arc<dyn BrandStore>> {
    match backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory brand store");
            Ok(Arc::new(MemoryBrandStore::new()))
        }
        StoreBackend::Sqlite(path) => {
            tracing::info!("Using SQLite brand store at {}", path.display());
            Ok(Arc::new(SqliteBrandStore::new(path.clone())?))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres(url) => {
            tracing::info!("Connecting to PostgreSQL...");
            let store = brandforge::store::pg_store::PgBrandStore::connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            tracing::info!("PostgreSQL migrations complete");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres(_) => {
            anyhow::bail!("BRAND_STORE=postgres requires building with --features postgres")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler the server runs until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
