use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::errors::StoreResult;
use super::record::{id_from_string, RawDocument};

// ============================================================================
// Backing Store Abstraction
// ============================================================================
//
// The access layer needs exactly three primitives from a schemaless store:
// insert-one, find-with-filter-and-limit and list-collection-names.
// Anything that provides them can sit behind `DocumentBackend`.
//
// ============================================================================

/// Body plus system timestamps for a document about to be inserted.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub body: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One exact-match predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Id(Uuid),
    CreatedAt(DateTime<Utc>),
    UpdatedAt(DateTime<Utc>),
    Field(String, Value),
}

impl Condition {
    pub fn matches(&self, doc: &RawDocument) -> bool {
        match self {
            Condition::Id(id) => doc.native_id == *id,
            Condition::CreatedAt(ts) => doc.created_at == *ts,
            Condition::UpdatedAt(ts) => doc.updated_at == *ts,
            Condition::Field(key, value) => doc.body.get(key).is_some_and(|stored| json_eq(stored, value)),
        }
    }
}

/// Structural equality where numbers compare by value, so `20` equals `20.0`.
pub fn json_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numbers_eq(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len() && a.iter().all(|(k, x)| b.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => left == right,
    }
}

fn numbers_eq(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Conjunction of equality predicates. System keys (`id`, `created_at`,
/// `updated_at`) address the system fields; every other key the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    unsatisfiable: bool,
}

impl Filter {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let mut filter = Filter::default();

        for (key, value) in fields {
            let condition = match key.as_str() {
                "id" | "_id" => value.as_str().and_then(id_from_string).map(Condition::Id),
                "created_at" => parse_timestamp(&value).map(Condition::CreatedAt),
                "updated_at" => parse_timestamp(&value).map(Condition::UpdatedAt),
                _ => Some(Condition::Field(key, value)),
            };

            match condition {
                Some(condition) => filter.conditions.push(condition),
                // A malformed system value can never equal a stored one
                None => filter.unsatisfiable = true,
            }
        }

        filter
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.unsatisfiable
    }

    pub fn matches(&self, doc: &RawDocument) -> bool {
        !self.unsatisfiable && self.conditions.iter().all(|c| c.matches(doc))
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Insert into `collection` (created implicitly) and return the stored document.
    async fn insert_one(&self, collection: &str, doc: NewDocument) -> StoreResult<RawDocument>;

    /// Up to `limit` documents of `collection` matching `filter`, in store order.
    async fn find(&self, collection: &str, filter: &Filter, limit: usize) -> StoreResult<Vec<RawDocument>>;

    async fn list_collection_names(&self) -> StoreResult<Vec<String>>;
}

/// Produces the single backend connection the store keeps for its lifetime.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short label for diagnostics, e.g. "postgres".
    fn kind(&self) -> &'static str;

    async fn connect(&self) -> StoreResult<Arc<dyn DocumentBackend>>;
}
