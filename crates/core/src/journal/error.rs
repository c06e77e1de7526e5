//! Journal error types.

use daftar_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::JournalStatus;

/// Errors that can occur during journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Journal must have at least one item.
    #[error("Journal must have at least one item")]
    NoItems,

    /// A line sets both debit and credit positive.
    #[error("Item {index} sets both debit and credit")]
    BothSidesSet {
        /// Zero-based position of the offending item.
        index: usize,
    },

    /// A line sets neither debit nor credit positive.
    #[error("Item {index} sets neither debit nor credit")]
    NoSideSet {
        /// Zero-based position of the offending item.
        index: usize,
    },

    /// A line carries a negative amount.
    #[error("Item {index} has a negative amount")]
    NegativeAmount {
        /// Zero-based position of the offending item.
        index: usize,
    },

    /// Debits and credits differ by more than the epsilon tolerance.
    #[error("Journal is unbalanced: debits ({debits}) != credits ({credits})")]
    Unbalanced {
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },

    /// Operation requires a draft journal.
    #[error("Journal is {0}, operation requires draft")]
    NotDraft(JournalStatus),

    /// Operation requires a posted journal.
    #[error("Journal is {0}, operation requires posted")]
    NotPosted(JournalStatus),
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match &err {
            JournalError::NoItems
            | JournalError::BothSidesSet { .. }
            | JournalError::NoSideSet { .. }
            | JournalError::NegativeAmount { .. } => Self::Validation(err.to_string()),
            JournalError::Unbalanced { .. } => Self::Invariant(err.to_string()),
            JournalError::NotDraft(_) | JournalError::NotPosted(_) => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_display() {
        let err = JournalError::Unbalanced {
            debits: dec!(150),
            credits: dec!(140),
        };
        assert_eq!(
            err.to_string(),
            "Journal is unbalanced: debits (150) != credits (140)"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = JournalError::NoItems.into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: AppError = JournalError::Unbalanced {
            debits: dec!(1),
            credits: dec!(2),
        }
        .into();
        assert_eq!(err.error_code(), "INVARIANT_VIOLATION");

        let err: AppError = JournalError::NotDraft(JournalStatus::Posted).into();
        assert_eq!(err.error_code(), "CONFLICT");
    }
}
