//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every multi-statement invariant-bearing operation runs inside a single
//! database transaction; sequential-number and code allocation is
//! read-then-insert with a unique-index backstop and a bounded retry loop.

pub mod catalog;
pub mod checkbook;
pub mod detail;
pub mod fiscal;
pub mod journal;
pub mod payment;
pub mod posting;
pub mod receipt;
pub mod settings;
pub mod treasury;

pub use catalog::{CatalogError, CatalogRepository, CreateNodeInput, UpdateNodeInput};
pub use checkbook::{
    CheckbookError, CheckbookRepository, CreateCheckbookInput, IssueCheckInput,
    RecordIncomingCheckInput,
};
pub use detail::{CreateDetailInput, DetailError, DetailRepository, UpdateDetailInput};
pub use fiscal::{CreateFiscalYearInput, FiscalError, FiscalYearRepository, UpdateFiscalYearInput};
pub use journal::{CreateJournalInput, JournalError, JournalRepository, JournalWithItems};
pub use payment::{PaymentError, PaymentRepository, SavePaymentInput};
pub use posting::{PostingError, PostingOutcome, PostingRepository};
pub use receipt::{ReceiptError, ReceiptRepository, SaveReceiptInput, SaveVoucherItemInput};
pub use settings::{SettingValue, SettingsError, SettingsRepository};
pub use treasury::{
    CreateBankAccountInput, CreateCardReaderInput, CreateCashboxInput, TreasuryError,
    TreasuryRepository,
};

/// Upper bound on whole-transaction retries after a unique-index conflict
/// during sequential-number or code allocation.
pub(crate) const MAX_SEQUENCE_ATTEMPTS: usize = 10;

/// Returns true if the error is a unique-constraint violation, the one
/// conflict repositories retry on.
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
