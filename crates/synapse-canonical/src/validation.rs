use thiserror::Error;

/// Validation errors for canonical primitives.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// When a value does not match the required pattern.
    #[error("{field} ('{value}') is not allowed")]
    PatternMismatch {
        /// Field name that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// When a timestamp cannot be interpreted as an instant.
    #[error("{field} ('{value}') is not a valid RFC 3339 timestamp")]
    InvalidTimestamp {
        /// Field name that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}
