//! Treasury error types.

use daftar_shared::AppError;
use thiserror::Error;

use super::check::{CheckKind, CheckStatus};

/// Errors that can occur during treasury operations.
#[derive(Debug, Error)]
pub enum TreasuryError {
    /// Check number falls outside the checkbook's page range.
    #[error("Check number {number} is outside the checkbook range [{first}, {last}]")]
    OutOfRange {
        /// The requested number.
        number: i64,
        /// First number in the checkbook.
        first: i64,
        /// Last number in the checkbook.
        last: i64,
    },

    /// Check number already issued in this checkbook.
    #[error("Check number {0} is already issued in this checkbook")]
    DuplicateNumber(i64),

    /// Checkbook has no pages left.
    #[error("Checkbook is exhausted")]
    CheckbookExhausted,

    /// Transition not present in the check state table.
    #[error("Invalid {kind:?} check transition: {from} -> {to}")]
    InvalidCheckTransition {
        /// Direction of the check.
        kind: CheckKind,
        /// Current status.
        from: CheckStatus,
        /// Requested status.
        to: CheckStatus,
    },

    /// Receipt/payment items using a cashbox instrument need a header cashbox.
    #[error("Items of type {0} require a cashbox on the header")]
    CashboxRequired(&'static str),
}

impl From<TreasuryError> for AppError {
    fn from(err: TreasuryError) -> Self {
        match &err {
            TreasuryError::OutOfRange { .. }
            | TreasuryError::InvalidCheckTransition { .. }
            | TreasuryError::CashboxRequired(_) => Self::Invariant(err.to_string()),
            TreasuryError::DuplicateNumber(_) | TreasuryError::CheckbookExhausted => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = TreasuryError::OutOfRange {
            number: 1030,
            first: 1000,
            last: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Check number 1030 is outside the checkbook range [1000, 1024]"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = TreasuryError::DuplicateNumber(1001).into();
        assert_eq!(err.error_code(), "CONFLICT");

        let err: AppError = TreasuryError::InvalidCheckTransition {
            kind: CheckKind::Incoming,
            from: CheckStatus::Created,
            to: CheckStatus::Spent,
        }
        .into();
        assert_eq!(err.error_code(), "INVARIANT_VIOLATION");
    }
}
