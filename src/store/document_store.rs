use chrono::{SubsecRound, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::schemas::Record;

use super::backend::{Connector, DocumentBackend, Filter, NewDocument};
use super::errors::StoreResult;
use super::record::{StoredRecord, RESERVED_KEYS};

// ============================================================================
// Document Store - generic create/list over any collection
// ============================================================================
//
// Owns the one backend connection for the process. The connection is
// established lazily by the first operation behind a `OnceCell`, so
// concurrent first calls share a single connect attempt. A failed attempt
// leaves the cell empty; the next operation tries again.
//
// State: Unconnected -> Connected (one-way).
//
// ============================================================================

pub const DEFAULT_LIST_LIMIT: i64 = 50;

pub struct DocumentStore {
    connector: Box<dyn Connector>,
    backend: OnceCell<Arc<dyn DocumentBackend>>,
}

impl DocumentStore {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::from_boxed(Box::new(connector))
    }

    pub fn from_boxed(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            backend: OnceCell::new(),
        }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.connector.kind()
    }

    pub fn is_connected(&self) -> bool {
        self.backend.initialized()
    }

    async fn backend(&self) -> StoreResult<&Arc<dyn DocumentBackend>> {
        self.backend
            .get_or_try_init(|| self.connector.connect())
            .await
    }

    /// Persist `record` into `collection` and return it with system fields.
    pub async fn create(&self, collection: &str, record: Record) -> StoreResult<StoredRecord> {
        self.create_fields(collection, record.into_fields()).await
    }

    /// Same as [`create`](Self::create) for an already-validated open map.
    pub async fn create_fields(&self, collection: &str, mut fields: Map<String, Value>) -> StoreResult<StoredRecord> {
        let backend = self.backend().await?;

        for key in RESERVED_KEYS {
            fields.remove(key);
        }

        // Postgres keeps microseconds; stamp at that precision so every
        // backend hands back exactly what it stored
        let now = Utc::now().trunc_subsecs(6);
        let doc = NewDocument {
            body: fields,
            created_at: now,
            updated_at: now,
        };

        let stored = backend.insert_one(collection, doc).await?;
        Ok(StoredRecord::from(stored))
    }

    /// Up to `limit` records of `collection` whose fields equal every
    /// filter pair. Order is whatever the backend yields.
    pub async fn list(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: i64,
    ) -> StoreResult<Vec<StoredRecord>> {
        let backend = self.backend().await?;

        let filter = Filter::from_fields(filter);
        if limit <= 0 || filter.is_unsatisfiable() {
            return Ok(Vec::new());
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let docs = backend.find(collection, &filter, limit).await?;
        Ok(docs.into_iter().map(StoredRecord::from).collect())
    }

    pub async fn collection_names(&self) -> StoreResult<Vec<String>> {
        self.backend().await?.list_collection_names().await
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{self, EntityKind};
    use crate::store::errors::StoreError;
    use crate::store::memory::{InMemoryBackend, InMemoryConnector};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts connects and yields mid-connect so first-use calls overlap.
    #[derive(Default)]
    struct CountingConnector {
        connects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        fn kind(&self) -> &'static str {
            "counting"
        }

        async fn connect(&self) -> StoreResult<Arc<dyn DocumentBackend>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Arc::new(InMemoryBackend::new()))
        }
    }

    /// Fails the first `failures` connects, then succeeds.
    struct FlakyConnector {
        failures: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        fn kind(&self) -> &'static str {
            "flaky"
        }

        async fn connect(&self) -> StoreResult<Arc<dyn DocumentBackend>> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(StoreError::unavailable("connection refused"));
            }
            Ok(Arc::new(InMemoryBackend::new()))
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn store() -> DocumentStore {
        DocumentStore::new(InMemoryConnector)
    }

    #[tokio::test]
    async fn test_create_then_list_round_trip() {
        let store = store();
        let record = schemas::validate("Prompt", json!({"name": "greet", "content": "Hi {name}"})).unwrap();
        let expected = record.clone().into_fields();

        let created = store.create("X", record).await.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.fields, expected);

        let listed = store.list("X", Map::new(), 1).await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_create_keeps_every_input_field() {
        let store = store();
        let record = schemas::validate("ChatbotShape", json!({"name": "bot", "font": "Inter"})).unwrap();
        let input = record.clone().into_fields();

        let created = store.create("chatbotshape", record).await.unwrap();
        for (key, value) in &input {
            assert_eq!(created.get(key), Some(value), "lost {key}");
        }

        let value = serde_json::to_value(&created).unwrap();
        for key in ["id", "created_at", "updated_at"] {
            assert!(value.get(key).is_some(), "missing system field {key}");
        }
    }

    #[tokio::test]
    async fn test_reserved_keys_are_replaced_by_system_values() {
        let store = store();
        let fields = map(json!({"title": "t", "id": "mine", "_id": 7, "created_at": "then"}));

        let created = store.create_fields("x", fields).await.unwrap();
        assert_ne!(created.id, "mine");
        assert!(created.get("_id").is_none());
        assert!(created.get("created_at").is_none());
        assert_eq!(created.get("title"), Some(&json!("t")));
    }

    #[tokio::test]
    async fn test_filter_exactness() {
        let store = store();
        for title in ["A", "B"] {
            let record = EntityKind::Knowledge.validate(json!({"title": title})).unwrap();
            store.create("X", record).await.unwrap();
        }

        let found = store.list("X", map(json!({"title": "A"})), DEFAULT_LIST_LIMIT).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&json!("A")));
    }

    #[tokio::test]
    async fn test_filter_plan_by_integer_price() {
        let store = store();
        let record = EntityKind::Plan
            .validate(json!({"tier": "pro", "monthly_price": 20}))
            .unwrap();
        let created = store.create("plan", record).await.unwrap();
        assert_eq!(created.get("monthly_price"), Some(&json!(20.0)));

        let found = store.list("plan", map(json!({"monthly_price": 20})), 50).await.unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn test_list_by_id() {
        let store = store();
        let first = store.create_fields("x", map(json!({"n": 1}))).await.unwrap();
        store.create_fields("x", map(json!({"n": 2}))).await.unwrap();

        let found = store.list("x", map(json!({"id": first.id.clone()})), 50).await.unwrap();
        assert_eq!(found, vec![first]);

        let found = store.list("x", map(json!({"id": "garbage"})), 50).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_limit_enforcement() {
        let store = store();
        for n in 0..100 {
            store.create_fields("bulk", map(json!({"n": n}))).await.unwrap();
        }

        assert_eq!(store.list("bulk", Map::new(), 10).await.unwrap().len(), 10);
        assert_eq!(store.list("bulk", Map::new(), DEFAULT_LIST_LIMIT).await.unwrap().len(), 50);
        assert_eq!(store.list("bulk", Map::new(), 500).await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_non_positive_limit_is_empty_not_error() {
        let store = store();
        store.create_fields("x", map(json!({"n": 1}))).await.unwrap();

        assert!(store.list("x", Map::new(), 0).await.unwrap().is_empty());
        assert!(store.list("x", Map::new(), -5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_collection_lists_empty() {
        let store = store();
        assert!(store.list("never_written", Map::new(), 50).await.unwrap().is_empty());
        assert!(store.collection_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_knowledge_scenario() {
        let store = store();
        let record = schemas::validate("Knowledge", json!({"title": "Intro", "tags": []})).unwrap();

        let created = store.create("knowledge", record).await.unwrap();
        assert_eq!(created.get("description"), Some(&json!("")));
        assert!(created.get("source_url").map_or(true, Value::is_null));
        assert_eq!(created.get("tags"), Some(&json!([])));
        assert!(!created.id.is_empty());
    }

    #[tokio::test]
    async fn test_api_key_scenario() {
        let store = store();
        let record = schemas::validate("APIKey", json!({"name": "prod", "key": "abc123"})).unwrap();

        let created = store.create("apikey", record).await.unwrap();
        assert_eq!(created.get("scopes"), Some(&json!(["read", "write"])));
    }

    #[tokio::test]
    async fn test_concurrent_first_use_connects_once() {
        let connector = CountingConnector::default();
        let connects = connector.connects.clone();
        let store = Arc::new(DocumentStore::new(connector));
        assert!(!store.is_connected());

        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    if n % 2 == 0 {
                        store.create_fields("x", map(json!({"n": n}))).await.map(|_| ())
                    } else {
                        store.list("x", Map::new(), 50).await.map(|_| ())
                    }
                })
            })
            .collect();

        for result in futures_util::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(store.is_connected());
        // Every write landed on the one shared backend
        assert_eq!(store.list("x", Map::new(), 50).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_unreachable_store_reports_unavailable_then_recovers() {
        let store = DocumentStore::new(FlakyConnector {
            failures: 2,
            attempts: AtomicUsize::new(0),
        });

        let err = store.create_fields("x", Map::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        let err = store.list("x", Map::new(), 10).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(!store.is_connected());

        // No retry inside the store; the caller's next call connects
        store.create_fields("x", Map::new()).await.unwrap();
        assert!(store.is_connected());
        assert_eq!(store.backend_kind(), "flaky");
    }
}
