use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ============================================================================
// Stored Records & Identifier Normalization
// ============================================================================
//
// The backing store identifies documents with a native `Uuid`. That type
// never leaves this layer: callers only ever see the string form in `id`.
//
// ============================================================================

/// Keys owned by the store. Input values under these keys are replaced.
pub const RESERVED_KEYS: [&str; 4] = ["id", "_id", "created_at", "updated_at"];

/// Document as the backend hands it back, native identifier included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub native_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: Map<String, Value>,
}

/// Record plus the three system fields, serialized flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl From<RawDocument> for StoredRecord {
    fn from(doc: RawDocument) -> Self {
        Self {
            id: id_to_string(&doc.native_id),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            fields: doc.body,
        }
    }
}

/// Native identifier -> public string id (lowercase hyphenated).
pub fn id_to_string(id: &Uuid) -> String {
    id.hyphenated().to_string()
}

/// Public string id -> native identifier. `None` for anything malformed.
pub fn id_from_string(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}
