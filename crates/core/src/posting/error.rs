//! Posting error types.

use daftar_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{CodeSlot, InstrumentType, VoucherStatus};

/// Errors that can occur while compiling a voucher into a journal.
#[derive(Debug, Error)]
pub enum PostingError {
    /// Voucher has already been posted.
    #[error("Voucher is {0:?}; it has already been posted")]
    AlreadyPosted(VoucherStatus),

    /// Voucher has no items.
    #[error("Voucher has no items")]
    MissingItems,

    /// Stored header total disagrees with the item sum.
    #[error("Voucher total {stated} does not match item sum {computed}")]
    TotalMismatch {
        /// Total stored on the header.
        stated: Decimal,
        /// Sum of the item amounts.
        computed: Decimal,
    },

    /// An instrument is not allowed on this voucher kind.
    #[error("Item {index} has instrument {instrument}, not allowed on this voucher")]
    InstrumentNotAllowed {
        /// Zero-based position of the offending item.
        index: usize,
        /// The offending instrument type.
        instrument: InstrumentType,
    },

    /// Cash/check items require a cashbox on the header.
    #[error("Item {index} ({instrument}) requires a cashbox on the header")]
    CashboxRequired {
        /// Zero-based position of the offending item.
        index: usize,
        /// The instrument that needs a cashbox.
        instrument: InstrumentType,
    },

    /// An item is missing its instrument target (bank account, card
    /// reader, or check reference).
    #[error("Item {index} ({instrument}) is missing its instrument reference")]
    MissingInstrumentTarget {
        /// Zero-based position of the offending item.
        index: usize,
        /// The instrument missing its reference.
        instrument: InstrumentType,
    },

    /// No tier of the resolution chain produced a valid code.
    #[error("No chart code configured for slot {0:?}")]
    MissingCodeMapping(CodeSlot),
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match &err {
            PostingError::AlreadyPosted(_) => Self::Conflict(err.to_string()),
            PostingError::MissingItems
            | PostingError::InstrumentNotAllowed { .. }
            | PostingError::MissingInstrumentTarget { .. } => Self::Validation(err.to_string()),
            PostingError::TotalMismatch { .. } | PostingError::CashboxRequired { .. } => {
                Self::Invariant(err.to_string())
            }
            PostingError::MissingCodeMapping(_) => Self::Configuration(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_mismatch_display() {
        let err = PostingError::TotalMismatch {
            stated: dec!(150),
            computed: dec!(140),
        };
        assert_eq!(
            err.to_string(),
            "Voucher total 150 does not match item sum 140"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = PostingError::AlreadyPosted(VoucherStatus::Sent).into();
        assert_eq!(err.error_code(), "CONFLICT");

        let err: AppError = PostingError::MissingCodeMapping(CodeSlot::Cash).into();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");

        let err: AppError = PostingError::TotalMismatch {
            stated: dec!(1),
            computed: dec!(2),
        }
        .into();
        assert_eq!(err.error_code(), "INVARIANT_VIOLATION");
    }
}
