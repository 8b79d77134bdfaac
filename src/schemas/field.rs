use serde_json::{Map, Number, Value};

use super::errors::ValidationError;

// ============================================================================
// Field Contracts - declarative shape of an entity schema
// ============================================================================
//
// A schema is a static table of fields. Validation walks the table in
// declaration order, so the first failing field is the one reported.
//
// ============================================================================

const NUL_REASON: &str = "strings must not contain NUL characters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub enum Presence {
    /// Absent or null input fails validation
    Required,
    /// Absent input becomes null
    Optional,
    /// Absent input takes the produced value
    Default(fn() -> Value),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub presence: Presence,
}

impl FieldSpec {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, presence: Presence::Required }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, presence: Presence::Optional }
    }

    pub const fn defaulted(name: &'static str, ty: FieldType, default: fn() -> Value) -> Self {
        Self { name, ty, presence: Presence::Default(default) }
    }
}

/// Named record shape. The field table is fixed at compile time.
#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    /// Closed schemas reject fields outside `fields`; open ones pass them through.
    pub closed: bool,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check required fields, apply defaults and coerce declared types.
    pub fn normalize(&self, mut raw: Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut out = Map::new();

        for field in self.fields {
            let value = match raw.remove(field.name) {
                None | Some(Value::Null) => match field.presence {
                    Presence::Required => return Err(ValidationError::missing(field.name)),
                    Presence::Optional => Value::Null,
                    Presence::Default(make) => make(),
                },
                Some(value) => field
                    .ty
                    .coerce(value)
                    .map_err(|reason| ValidationError::new(field.name, reason))?,
            };
            out.insert(field.name.to_string(), value);
        }

        // Whatever is left in `raw` is outside the declared field set
        for (key, value) in raw {
            if self.closed {
                return Err(ValidationError::new(key, "unknown field"));
            }
            if key.contains('\0') || contains_nul(&value) {
                return Err(ValidationError::new(key, NUL_REASON));
            }
            out.insert(key, value);
        }

        Ok(out)
    }
}

impl FieldType {
    pub fn coerce(self, value: Value) -> Result<Value, String> {
        match self {
            FieldType::String => match value {
                Value::String(s) if s.contains('\0') => Err(NUL_REASON.to_string()),
                Value::String(_) => Ok(value),
                other => Err(format!("expected string, got {}", kind_of(&other))),
            },
            FieldType::Integer => coerce_integer(value),
            FieldType::Number => coerce_number(value),
            FieldType::Boolean => match value {
                Value::Bool(_) => Ok(value),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                other => Err(format!("expected boolean, got {}", kind_of(&other))),
            },
            FieldType::StringList => match value {
                Value::Array(items) => {
                    if let Some(pos) = items.iter().position(|item| !item.is_string()) {
                        return Err(format!("expected list of strings, item {pos} is {}", kind_of(&items[pos])));
                    }
                    if let Some(pos) = items.iter().position(contains_nul) {
                        return Err(format!("item {pos}: {NUL_REASON}"));
                    }
                    Ok(Value::Array(items))
                }
                other => Err(format!("expected list of strings, got {}", kind_of(&other))),
            },
        }
    }
}

fn coerce_integer(value: Value) -> Result<Value, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            if n.is_u64() {
                return Err(format!("integer {n} is out of range"));
            }
            match n.as_f64() {
                // i64::MAX as f64 rounds up to 2^63, which no i64 can hold
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                Some(f) if f.fract() == 0.0 => Err(format!("integer {n} is out of range")),
                _ => Err("expected integer, got fractional number".to_string()),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("expected integer, got malformed string {s:?}")),
        other => Err(format!("expected integer, got {}", kind_of(&other))),
    }
}

fn coerce_number(value: Value) -> Result<Value, String> {
    match value {
        Value::Number(_) => Ok(value),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, got malformed string {s:?}")),
        other => Err(format!("expected number, got {}", kind_of(&other))),
    }
}

fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map.iter().any(|(k, v)| k.contains('\0') || contains_nul(v)),
        _ => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
