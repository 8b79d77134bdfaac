use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vibe_dashboard::api::{self, AppState};
use vibe_dashboard::config::AppConfig;
use vibe_dashboard::metrics::Metrics;
use vibe_dashboard::store::DocumentStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vibe_dashboard=debug"))
        )
        .init();

    tracing::info!("🚀 Starting Chatbot Dashboard API");

    // === 1. Configuration from the environment ===
    let config = AppConfig::from_env()?;
    tracing::info!(
        database_name = %config.database_name,
        memory_backend = config.uses_memory_backend(),
        "Loaded configuration"
    );

    // === 2. Document store (connects lazily on first request) ===
    let store = DocumentStore::from_boxed(config.connector());

    // === 3. Prometheus metrics ===
    let metrics = Metrics::new()?;

    let bind = (config.host.clone(), config.port);
    let frontend_url = config.frontend_url.clone();
    let state = web::Data::new(AppState { store, metrics, config });

    // === 4. HTTP server ===
    tracing::info!("📡 Listening on http://{}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(api::cors_headers(&frontend_url))
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
