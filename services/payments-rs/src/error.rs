// services/payments-rs/src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecordError>;

/// Failures surfaced by [`crate::recorder::PaymentRecorder::record`].
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required payload field was missing or empty. Client error, never retried.
    #[error("invalid payload: {field} is required")]
    InvalidPayload { field: &'static str },

    /// The durable store failed. A duplicate fingerprint is not a failure.
    #[error("storage failure: {0}")]
    StorageFailure(#[from] sqlx::Error),
}

impl RecordError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, RecordError::InvalidPayload { .. })
    }
}
