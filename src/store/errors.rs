// ============================================================================
// Document Store Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or an operation against it
    /// could not complete. Callers may retry; the store itself never does.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        StoreError::Unavailable(reason.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::unavailable(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
