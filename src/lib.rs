// ============================================================================
// Chatbot Dashboard Backend
// ============================================================================
//
// - `schemas`: entity schema set and validation into typed records
// - `store`:   generic document-store access layer (create / list)
// - `api`:     actix-web routes over both
// - `config`, `metrics`: environment configuration and Prometheus metrics
//
// ============================================================================

pub mod api;
pub mod config;
pub mod metrics;
pub mod schemas;
pub mod store;
