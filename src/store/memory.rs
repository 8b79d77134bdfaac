use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::backend::{Connector, DocumentBackend, Filter, NewDocument};
use super::errors::StoreResult;
use super::record::RawDocument;

// ============================================================================
// In-Memory Backend
// ============================================================================
//
// Process-local document store used for tests and `memory://` URLs.
// Collections keep insertion order, which is what `find` returns.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn insert_one(&self, collection: &str, doc: NewDocument) -> StoreResult<RawDocument> {
        let stored = RawDocument {
            native_id: Uuid::now_v7(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            body: doc.body,
        };

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn find(&self, collection: &str, filter: &Filter, limit: usize) -> StoreResult<Vec<RawDocument>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Hands out a fresh in-memory backend on connect.
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryConnector;

#[async_trait]
impl Connector for InMemoryConnector {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> StoreResult<Arc<dyn DocumentBackend>> {
        tracing::info!("Using in-memory document backend");
        Ok(Arc::new(InMemoryBackend::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Map, Value};

    fn new_doc(title: &str) -> NewDocument {
        let now = Utc::now();
        let mut body = Map::new();
        body.insert("title".to_string(), json!(title));
        NewDocument {
            body,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_creates_collection_implicitly() {
        let backend = InMemoryBackend::new();
        assert!(backend.list_collection_names().await.unwrap().is_empty());

        backend.insert_one("prompt", new_doc("a")).await.unwrap();
        backend.insert_one("knowledge", new_doc("b")).await.unwrap();

        assert_eq!(
            backend.list_collection_names().await.unwrap(),
            vec!["knowledge".to_string(), "prompt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_find_on_missing_collection_is_empty() {
        let backend = InMemoryBackend::new();
        let found = backend.find("nothing", &Filter::default(), 50).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_respects_filter_and_limit() {
        let backend = InMemoryBackend::new();
        for title in ["A", "B", "A", "A"] {
            backend.insert_one("x", new_doc(title)).await.unwrap();
        }

        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::from("A"));
        let filter = Filter::from_fields(fields);

        assert_eq!(backend.find("x", &filter, 50).await.unwrap().len(), 3);
        assert_eq!(backend.find("x", &filter, 2).await.unwrap().len(), 2);
        assert_eq!(backend.find("x", &Filter::default(), 0).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_native_ids() {
        let backend = InMemoryBackend::new();
        let first = backend.insert_one("x", new_doc("a")).await.unwrap();
        let second = backend.insert_one("x", new_doc("a")).await.unwrap();
        assert_ne!(first.native_id, second.native_id);
    }
}
