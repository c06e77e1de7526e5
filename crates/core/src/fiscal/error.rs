//! Fiscal year error types.

use chrono::NaiveDate;
use daftar_shared::AppError;
use daftar_shared::types::FiscalYearId;
use thiserror::Error;

/// Errors that can occur during fiscal year operations.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Start date must be before end date.
    #[error("Start date must be before end date")]
    InvalidDateRange,

    /// A fiscal year already starts on this date.
    #[error("A fiscal year already starts on {0}")]
    DuplicateRange(NaiveDate),

    /// Rolling forward requires the source year to be closed.
    #[error("Fiscal year {0} must be closed before rolling forward")]
    MustBeClosed(FiscalYearId),

    /// Year is referenced by documents.
    #[error("Fiscal year {0} has documents")]
    HasDocuments(FiscalYearId),

    /// Date edits are rejected once the year has documents.
    #[error("Fiscal year {0} has documents; dates cannot change")]
    DatesLocked(FiscalYearId),

    /// More than one year is open; the exclusivity invariant is broken.
    #[error("{0} fiscal years are open, expected at most one")]
    MultipleOpenYears(usize),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    NotFound(FiscalYearId),
}

impl From<FiscalError> for AppError {
    fn from(err: FiscalError) -> Self {
        match &err {
            FiscalError::InvalidDateRange => Self::Validation(err.to_string()),
            FiscalError::MultipleOpenYears(_) => Self::Invariant(err.to_string()),
            FiscalError::DuplicateRange(_)
            | FiscalError::MustBeClosed(_)
            | FiscalError::HasDocuments(_)
            | FiscalError::DatesLocked(_) => Self::Conflict(err.to_string()),
            FiscalError::NotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = FiscalError::InvalidDateRange.into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: AppError = FiscalError::HasDocuments(FiscalYearId::new()).into();
        assert_eq!(err.error_code(), "CONFLICT");

        let err: AppError = FiscalError::MultipleOpenYears(2).into();
        assert_eq!(err.error_code(), "INVARIANT_VIOLATION");
    }
}
