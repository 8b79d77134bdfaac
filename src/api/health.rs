use chrono::{DateTime, Utc};

use crate::store::DocumentStore;

// ============================================================================
// Health Check Abstractions
// ============================================================================

/// Health status of a component
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Wording reported as `connection_status` by the probe endpoint
    pub fn connection_status(&self) -> String {
        match self {
            HealthStatus::Healthy => "connected".to_string(),
            HealthStatus::Unhealthy(reason) => format!("unavailable: {reason}"),
        }
    }
}

/// Health information for a component
#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
        }
    }
}

/// Round-trip the store by listing its collections.
pub async fn probe_store(store: &DocumentStore) -> (ComponentHealth, Vec<String>) {
    match store.collection_names().await {
        Ok(collections) => (
            ComponentHealth::new("document_store", HealthStatus::Healthy),
            collections,
        ),
        Err(err) => {
            tracing::error!(error = %err, backend = store.backend_kind(), "Store probe failed");
            (
                ComponentHealth::new("document_store", HealthStatus::Unhealthy(err.to_string())),
                Vec::new(),
            )
        }
    }
}
