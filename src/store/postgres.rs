use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::backend::{Condition, Connector, DocumentBackend, Filter, NewDocument};
use super::errors::StoreResult;
use super::record::RawDocument;

// ============================================================================
// Postgres Backend - schemaless documents in a JSONB table
// ============================================================================
//
// Every collection lives in one `documents` table, keyed by the
// `collection` column, inside a Postgres schema named after the logical
// database. The table is created on first connect, so collections stay
// implicit just like in a native document store.
//
// Filters compile to `body -> key = value::jsonb` per pair: arrays and
// objects compare whole, never by containment.
//
// ============================================================================

type DocumentRow = (Uuid, Json<Map<String, Value>>, DateTime<Utc>, DateTime<Utc>);

pub struct PostgresConnector {
    url: String,
    database_name: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PostgresConnector {
    pub fn new(url: impl Into<String>, database_name: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            database_name: database_name.into(),
            max_connections,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn connect(&self) -> StoreResult<Arc<dyn DocumentBackend>> {
        tracing::info!(database = %self.database_name, "Connecting to Postgres...");

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url)
            .await?;

        let backend = PostgresBackend::new(pool, &self.database_name);
        backend.bootstrap().await?;

        tracing::info!(
            database = %self.database_name,
            table = %backend.table,
            "✅ Connected to Postgres document store"
        );

        Ok(Arc::new(backend))
    }
}

pub struct PostgresBackend {
    pool: PgPool,
    schema: String,
    table: String,
}

impl PostgresBackend {
    pub fn new(pool: PgPool, database_name: &str) -> Self {
        let schema = quote_ident(database_name);
        let table = format!("{schema}.documents");
        Self { pool, schema, table }
    }

    /// Create the schema, table and collection index if missing.
    async fn bootstrap(&self) -> StoreResult<()> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                collection TEXT NOT NULL,
                body JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS documents_collection_idx ON {} (collection)",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for PostgresBackend {
    async fn insert_one(&self, collection: &str, doc: NewDocument) -> StoreResult<RawDocument> {
        let row: DocumentRow = sqlx::query_as(&format!(
            "INSERT INTO {} (id, collection, body, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, body, created_at, updated_at",
            self.table
        ))
        .bind(Uuid::now_v7())
        .bind(collection)
        .bind(Json(&doc.body))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(from_row(row))
    }

    async fn find(&self, collection: &str, filter: &Filter, limit: usize) -> StoreResult<Vec<RawDocument>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut query = build_find_query(&self.table, collection, filter, limit);

        let rows: Vec<DocumentRow> = query.build_query_as::<DocumentRow>().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT DISTINCT collection FROM {} ORDER BY collection",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}

fn from_row((native_id, Json(body), created_at, updated_at): DocumentRow) -> RawDocument {
    RawDocument {
        native_id,
        created_at,
        updated_at,
        body,
    }
}

/// `SELECT` for one collection with every filter condition bound as a parameter.
pub(crate) fn build_find_query(
    table: &str,
    collection: &str,
    filter: &Filter,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT id, body, created_at, updated_at FROM {table} WHERE collection = "
    ));
    query.push_bind(collection.to_string());

    for condition in filter.conditions() {
        match condition {
            Condition::Id(id) => {
                query.push(" AND id = ").push_bind(*id);
            }
            Condition::CreatedAt(ts) => {
                query.push(" AND created_at = ").push_bind(*ts);
            }
            Condition::UpdatedAt(ts) => {
                query.push(" AND updated_at = ").push_bind(*ts);
            }
            Condition::Field(key, value) => {
                query
                    .push(" AND body -> ")
                    .push_bind(key.clone())
                    .push(" = ")
                    .push_bind(Json(value.clone()));
            }
        }
    }

    query.push(" LIMIT ").push_bind(limit);
    query
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
