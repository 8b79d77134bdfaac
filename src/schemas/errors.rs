// ============================================================================
// Schema Validation Errors
// ============================================================================

/// First unsatisfiable constraint found while validating raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field `{field}`: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "field required")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown schema: {0}")]
pub struct UnknownSchema(pub String);

impl From<UnknownSchema> for ValidationError {
    fn from(err: UnknownSchema) -> Self {
        ValidationError::new("schema", err.to_string())
    }
}
