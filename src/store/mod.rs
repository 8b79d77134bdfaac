// ============================================================================
// Document Store Access Layer
// ============================================================================
//
// Collection-agnostic persistence for validated records:
// - `DocumentStore`: lazy single connection, `create` and `list`
// - `DocumentBackend` / `Connector`: the seam to the schemaless store
// - Backends: Postgres (JSONB) and in-memory
//
// ============================================================================

pub mod backend;
pub mod document_store;
pub mod errors;
pub mod memory;
pub mod postgres;
pub mod record;

pub use backend::{Condition, Connector, DocumentBackend, Filter, NewDocument};
pub use document_store::{DocumentStore, DEFAULT_LIST_LIMIT};
pub use errors::{StoreError, StoreResult};
pub use memory::{InMemoryBackend, InMemoryConnector};
pub use postgres::{PostgresBackend, PostgresConnector};
pub use record::{id_from_string, id_to_string, RawDocument, StoredRecord};
