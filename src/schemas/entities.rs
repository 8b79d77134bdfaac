use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use super::errors::{UnknownSchema, ValidationError};
use super::field::{EntitySchema, FieldSpec, FieldType};

// ============================================================================
// Entity Schemas
// ============================================================================
//
// Each dashboard panel persists one entity kind. The static tables below
// drive validation; the typed structs are what a validated Record holds.
// All schemas are open: unknown fields survive in `extra`.
//
// ============================================================================

fn empty_string() -> Value {
    json!("")
}

fn empty_list() -> Value {
    json!([])
}

fn text_type() -> Value {
    json!("text")
}

fn primary_color() -> Value {
    json!("#ff7a00")
}

fn accent_color() -> Value {
    json!("#111827")
}

fn rounded() -> Value {
    json!("rounded")
}

fn one_seat() -> Value {
    json!(1)
}

fn read_write() -> Value {
    json!(["read", "write"])
}

pub static KNOWLEDGE: EntitySchema = EntitySchema {
    name: "Knowledge",
    fields: &[
        FieldSpec::required("title", FieldType::String),
        FieldSpec::defaulted("description", FieldType::String, empty_string),
        FieldSpec::defaulted("tags", FieldType::StringList, empty_list),
        FieldSpec::optional("source_url", FieldType::String),
    ],
    closed: false,
};

pub static PROMPT: EntitySchema = EntitySchema {
    name: "Prompt",
    fields: &[
        FieldSpec::required("name", FieldType::String),
        FieldSpec::required("content", FieldType::String),
        FieldSpec::defaulted("variables", FieldType::StringList, empty_list),
    ],
    closed: false,
};

pub static DOCUMENT: EntitySchema = EntitySchema {
    name: "Document",
    fields: &[
        FieldSpec::required("title", FieldType::String),
        FieldSpec::required("content", FieldType::String),
        FieldSpec::defaulted("type", FieldType::String, text_type),
    ],
    closed: false,
};

pub static CHATBOT_SHAPE: EntitySchema = EntitySchema {
    name: "ChatbotShape",
    fields: &[
        FieldSpec::required("name", FieldType::String),
        FieldSpec::defaulted("primary_color", FieldType::String, primary_color),
        FieldSpec::defaulted("accent_color", FieldType::String, accent_color),
        FieldSpec::defaulted("bubble_style", FieldType::String, rounded),
        FieldSpec::optional("avatar", FieldType::String),
    ],
    closed: false,
};

pub static PLAN: EntitySchema = EntitySchema {
    name: "Plan",
    fields: &[
        FieldSpec::required("tier", FieldType::String),
        FieldSpec::defaulted("seats", FieldType::Integer, one_seat),
        FieldSpec::required("monthly_price", FieldType::Number),
    ],
    closed: false,
};

pub static API_KEY: EntitySchema = EntitySchema {
    name: "APIKey",
    fields: &[
        FieldSpec::required("name", FieldType::String),
        FieldSpec::required("key", FieldType::String),
        FieldSpec::defaulted("scopes", FieldType::StringList, read_write),
    ],
    closed: false,
};

pub static CHAT_MESSAGE: EntitySchema = EntitySchema {
    name: "ChatMessage",
    fields: &[
        FieldSpec::required("role", FieldType::String),
        FieldSpec::required("content", FieldType::String),
    ],
    closed: false,
};

// ============================================================================
// Entity Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Knowledge,
    Prompt,
    Document,
    ChatbotShape,
    Plan,
    ApiKey,
    ChatMessage,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Knowledge,
        EntityKind::Prompt,
        EntityKind::Document,
        EntityKind::ChatbotShape,
        EntityKind::Plan,
        EntityKind::ApiKey,
        EntityKind::ChatMessage,
    ];

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Knowledge => &KNOWLEDGE,
            EntityKind::Prompt => &PROMPT,
            EntityKind::Document => &DOCUMENT,
            EntityKind::ChatbotShape => &CHATBOT_SHAPE,
            EntityKind::Plan => &PLAN,
            EntityKind::ApiKey => &API_KEY,
            EntityKind::ChatMessage => &CHAT_MESSAGE,
        }
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    /// Collection the kind is persisted to: the schema name lowercased.
    pub fn collection(self) -> String {
        self.name().to_ascii_lowercase()
    }

    /// ChatMessage only shapes chat requests and is never stored.
    pub fn is_persisted(self) -> bool {
        !matches!(self, EntityKind::ChatMessage)
    }

    /// Validate raw input into a fully-defaulted Record of this kind.
    /// Kinds that are never stored have no Record and are rejected.
    pub fn validate(self, raw: Value) -> Result<Record, ValidationError> {
        if !self.is_persisted() {
            return Err(ValidationError::new("schema", format!("{self} is not a stored record kind")));
        }
        let normalized = self.normalize(raw)?;

        let record = match self {
            EntityKind::Knowledge => Record::Knowledge(typed(self, normalized)?),
            EntityKind::Prompt => Record::Prompt(typed(self, normalized)?),
            EntityKind::Document => Record::Document(typed(self, normalized)?),
            EntityKind::ChatbotShape => Record::ChatbotShape(typed(self, normalized)?),
            EntityKind::Plan => Record::Plan(typed(self, normalized)?),
            EntityKind::ApiKey => Record::ApiKey(typed(self, normalized)?),
            EntityKind::ChatMessage => unreachable!("is_persisted is false for ChatMessage"),
        };
        Ok(record)
    }

    fn normalize(self, raw: Value) -> Result<Value, ValidationError> {
        let Value::Object(raw) = raw else {
            return Err(ValidationError::new(self.name(), "expected a JSON object"));
        };
        Ok(Value::Object(self.schema().normalize(raw)?))
    }
}

fn typed<T: serde::de::DeserializeOwned>(kind: EntityKind, value: Value) -> Result<T, ValidationError> {
    serde_json::from_value(value).map_err(|e| ValidationError::new(kind.name(), e.to_string()))
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownSchema;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSchema(s.to_string()))
    }
}

/// Validate raw input against the schema named `schema_name`.
pub fn validate(schema_name: &str, raw: Value) -> Result<Record, ValidationError> {
    let kind: EntityKind = schema_name.parse()?;
    kind.validate(raw)
}

// ============================================================================
// Typed Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub content: String,
    pub variables: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotShape {
    pub name: String,
    pub primary_color: String,
    pub accent_color: String,
    pub bubble_style: String,
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub tier: String,
    pub seats: i64,
    pub monthly_price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub name: String,
    pub key: String,
    pub scopes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// Chat messages shape `/chat` requests only, so they validate outside `Record`.
    pub fn validate(raw: Value) -> Result<Self, ValidationError> {
        let kind = EntityKind::ChatMessage;
        typed(kind, kind.normalize(raw)?)
    }
}

/// A validated record, tagged with the schema that shaped it.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Knowledge(Knowledge),
    Prompt(Prompt),
    Document(Document),
    ChatbotShape(ChatbotShape),
    Plan(Plan),
    ApiKey(ApiKey),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Knowledge(_) => EntityKind::Knowledge,
            Record::Prompt(_) => EntityKind::Prompt,
            Record::Document(_) => EntityKind::Document,
            Record::ChatbotShape(_) => EntityKind::ChatbotShape,
            Record::Plan(_) => EntityKind::Plan,
            Record::ApiKey(_) => EntityKind::ApiKey,
        }
    }

    /// Flatten into the open key/value shape handed to the store.
    pub fn into_fields(self) -> Map<String, Value> {
        let value = match &self {
            Record::Knowledge(r) => serde_json::to_value(r),
            Record::Prompt(r) => serde_json::to_value(r),
            Record::Document(r) => serde_json::to_value(r),
            Record::ChatbotShape(r) => serde_json::to_value(r),
            Record::Plan(r) => serde_json::to_value(r),
            Record::ApiKey(r) => serde_json::to_value(r),
        };

        // Every variant is a struct with string keys, which always serializes to an object
        match value {
            Ok(Value::Object(map)) => map,
            other => unreachable!("{} record did not serialize to an object: {other:?}", self.kind()),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
