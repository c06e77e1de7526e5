//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Module-level errors (catalog, journal, fiscal, treasury, posting) convert
/// into this rollup at the boundary where a caller no longer cares which
/// subsystem failed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input; locally recoverable by the caller.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A business invariant would be violated; rejected before any write.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Conflicting state (duplicate code, already-posted document).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation rejected for this caller (e.g. system-managed records).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Operator setup gap (missing code mapping, exhausted code space).
    /// Fatal for the operation, not for the process.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Invariant(_) | Self::Configuration(_) => 422,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Invariant(_) => "INVARIANT_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
