//! Persistence error kinds.

/// Errors a [`super::Store`] implementation can return.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached (connection, pool exhaustion,
    /// query timeout). Maps to HTTP 503 at the API boundary; on the upload
    /// path, the whole ingestion transaction is rolled back.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// A unique-constraint conflict the caller is expected to handle
    /// itself (e.g. a duplicate (mac, measurement_id)). Only constructed by
    /// `Store` implementations for conflicts `ingest` doesn't already probe
    /// for before writing.
    #[error("constraint conflict: {0}")]
    ConstraintConflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err)
    }
}
