// ============================================================================
// HTTP Route Layer
// ============================================================================
//
// Thin actix-web surface over the schema set and the document store:
// every panel gets a POST (validate + create) and GET (list) pair, plus
// the connection probe, demo chat, health and metrics endpoints.
//
// ============================================================================

pub mod chat;
pub mod errors;
pub mod health;
pub mod routes;

use actix_web::middleware::DefaultHeaders;
use actix_web::web;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::schemas::EntityKind;
use crate::store::DocumentStore;

pub use errors::ApiError;

/// Process-scoped state shared by every worker.
pub struct AppState {
    pub store: DocumentStore,
    pub metrics: Metrics,
    pub config: AppConfig,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(routes::root))
    .route("/test", web::get().to(routes::test_connection))
    .route("/health", web::get().to(routes::health_handler))
    .route("/metrics", web::get().to(routes::metrics_handler))
    .route("/chat", web::post().to(routes::chat_handler))
    .service(routes::entity_resource("/knowledge", EntityKind::Knowledge))
    .service(routes::entity_resource("/prompts", EntityKind::Prompt))
    .service(routes::entity_resource("/documents", EntityKind::Document))
    .service(routes::entity_resource("/chatbot-shape", EntityKind::ChatbotShape))
    .service(routes::entity_resource("/plan", EntityKind::Plan))
    .service(routes::entity_resource("/api-keys", EntityKind::ApiKey));
}

/// Allow the configured frontend origin on every response.
pub fn cors_headers(frontend_url: &str) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", frontend_url.to_string()))
        .add(("Access-Control-Allow-Methods", "*"))
        .add(("Access-Control-Allow-Headers", "*"))
}
