//! Checkbook and check repository.
//!
//! Outgoing checks are issued from checkbooks (range-validated, duplicate
//! rejected, last page exhausts the book); incoming checks are recorded
//! directly. Status transitions beyond issuance are owned by the receipt
//! and payment repositories.

use chrono::NaiveDate;
use daftar_core::treasury::{self, check::CheckKind as CoreCheckKind, validate_issue_number};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    bank_accounts, checkbooks, checks,
    sea_orm_active_enums::{CheckKind, CheckStatus, CheckbookStatus},
};
use crate::repositories::is_unique_violation;

/// Error types for checkbook operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckbookError {
    /// An issuance or state rule was violated.
    #[error(transparent)]
    Rule(#[from] treasury::TreasuryError),

    /// Checkbook not found.
    #[error("Checkbook not found: {0}")]
    NotFound(Uuid),

    /// Check not found.
    #[error("Check not found: {0}")]
    CheckNotFound(Uuid),

    /// Bank account not found.
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a checkbook.
#[derive(Debug, Clone)]
pub struct CreateCheckbookInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Bank account the pages draw on.
    pub bank_account_id: Uuid,
    /// Printed serial of the book.
    pub serial: String,
    /// First check number in the book.
    pub start_number: i64,
    /// Number of pages.
    pub page_count: i64,
}

/// Input for issuing an outgoing check from a checkbook.
#[derive(Debug, Clone)]
pub struct IssueCheckInput {
    /// Check number; must fall inside the checkbook's page range.
    pub number: i64,
    /// Face amount.
    pub amount: Decimal,
    /// Date written.
    pub issue_date: NaiveDate,
    /// Date payable.
    pub due_date: NaiveDate,
    /// Counterparty the check is written to.
    pub beneficiary_detail_id: Option<Uuid>,
}

/// Input for recording an incoming check.
#[derive(Debug, Clone)]
pub struct RecordIncomingCheckInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Number printed on the received check.
    pub number: i64,
    /// Face amount.
    pub amount: Decimal,
    /// Date written.
    pub issue_date: NaiveDate,
    /// Date payable.
    pub due_date: NaiveDate,
    /// Counterparty the check came from.
    pub beneficiary_detail_id: Option<Uuid>,
}

/// Checkbook and check repository.
#[derive(Debug, Clone)]
pub struct CheckbookRepository {
    db: DatabaseConnection,
}

impl CheckbookRepository {
    /// Creates a new checkbook repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a checkbook against a bank account.
    pub async fn create_checkbook(
        &self,
        input: CreateCheckbookInput,
    ) -> Result<checkbooks::Model, CheckbookError> {
        bank_accounts::Entity::find_by_id(input.bank_account_id)
            .one(&self.db)
            .await?
            .ok_or(CheckbookError::BankAccountNotFound(input.bank_account_id))?;

        let now = chrono::Utc::now().into();
        Ok(checkbooks::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            bank_account_id: Set(input.bank_account_id),
            serial: Set(input.serial),
            start_number: Set(input.start_number),
            page_count: Set(input.page_count),
            status: Set(CheckbookStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?)
    }

    /// Issues an outgoing check from a checkbook.
    ///
    /// Fails when the number falls outside the page range or is already
    /// issued; no row is created in either case. Issuing the last page
    /// flips the checkbook to exhausted in the same transaction.
    pub async fn issue_check(
        &self,
        checkbook_id: Uuid,
        input: IssueCheckInput,
    ) -> Result<checks::Model, CheckbookError> {
        let txn = self.db.begin().await?;

        let book = checkbooks::Entity::find_by_id(checkbook_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(CheckbookError::NotFound(checkbook_id))?;

        if book.status == CheckbookStatus::Exhausted {
            return Err(treasury::TreasuryError::CheckbookExhausted.into());
        }

        let exhausts = validate_issue_number(book.start_number, book.page_count, input.number)
            .map_err(CheckbookError::Rule)?;

        let taken = checks::Entity::find()
            .filter(checks::Column::CheckbookId.eq(checkbook_id))
            .filter(checks::Column::Number.eq(input.number))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(treasury::TreasuryError::DuplicateNumber(input.number).into());
        }

        let now = chrono::Utc::now().into();
        let check_result = checks::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(book.organization_id),
            kind: Set(CheckKind::Outgoing),
            checkbook_id: Set(Some(checkbook_id)),
            number: Set(input.number),
            amount: Set(input.amount),
            issue_date: Set(input.issue_date),
            due_date: Set(input.due_date),
            beneficiary_detail_id: Set(input.beneficiary_detail_id),
            status: Set(CheckStatus::Issued),
            cashbox_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await;

        // The unique index on (checkbook_id, number) backstops the
        // duplicate query above under concurrent issuance.
        let check = match check_result {
            Ok(check) => check,
            Err(err) if is_unique_violation(&err) => {
                return Err(treasury::TreasuryError::DuplicateNumber(input.number).into());
            }
            Err(err) => return Err(err.into()),
        };

        if exhausts {
            let mut active: checkbooks::ActiveModel = book.into();
            active.status = Set(CheckbookStatus::Exhausted);
            active.updated_at = Set(now);
            active.update(&txn).await?;
            tracing::info!(checkbook = %checkbook_id, "checkbook exhausted");
        }

        txn.commit().await?;
        Ok(check)
    }

    /// Records an incoming check received from a counterparty.
    pub async fn record_incoming_check(
        &self,
        input: RecordIncomingCheckInput,
    ) -> Result<checks::Model, CheckbookError> {
        let now = chrono::Utc::now().into();
        Ok(checks::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            kind: Set(CheckKind::Incoming),
            checkbook_id: Set(None),
            number: Set(input.number),
            amount: Set(input.amount),
            issue_date: Set(input.issue_date),
            due_date: Set(input.due_date),
            beneficiary_detail_id: Set(input.beneficiary_detail_id),
            status: Set(CheckStatus::from(CoreCheckKind::Incoming.initial_status())),
            cashbox_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?)
    }

    /// Fetches a check by id.
    pub async fn get_check(&self, id: Uuid) -> Result<checks::Model, CheckbookError> {
        checks::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CheckbookError::CheckNotFound(id))
    }

    /// Lists an organization's checks, optionally by status.
    pub async fn list_checks(
        &self,
        organization_id: Uuid,
        status: Option<daftar_core::treasury::CheckStatus>,
    ) -> Result<Vec<checks::Model>, CheckbookError> {
        let mut query = checks::Entity::find()
            .filter(checks::Column::OrganizationId.eq(organization_id));
        if let Some(status) = status {
            query = query.filter(checks::Column::Status.eq(CheckStatus::from(status)));
        }

        Ok(query
            .order_by_asc(checks::Column::DueDate)
            .all(&self.db)
            .await?)
    }

    /// Lists an organization's checkbooks.
    pub async fn list_checkbooks(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<checkbooks::Model>, CheckbookError> {
        Ok(checkbooks::Entity::find()
            .filter(checkbooks::Column::OrganizationId.eq(organization_id))
            .order_by_asc(checkbooks::Column::Serial)
            .all(&self.db)
            .await?)
    }
}

// ========== Check state transitions (driven by receipt/payment saves) ==========

/// Fetches a check with a row lock, preventing two concurrent saves from
/// leaving it in two states.
pub(crate) async fn find_check_locked(
    txn: &sea_orm::DatabaseTransaction,
    id: Uuid,
) -> Result<checks::Model, CheckbookError> {
    checks::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(CheckbookError::CheckNotFound(id))
}

/// Moves a locked check to a new status through the core transition table,
/// optionally restamping its cashbox (`Some(None)` clears the stamp).
pub(crate) async fn transition_check(
    txn: &sea_orm::DatabaseTransaction,
    check: checks::Model,
    to: daftar_core::treasury::CheckStatus,
    cashbox: Option<Option<Uuid>>,
) -> Result<checks::Model, CheckbookError> {
    let kind: CoreCheckKind = check.kind.clone().into();
    let from: daftar_core::treasury::CheckStatus = check.status.clone().into();
    let next = from.transition(kind, to).map_err(CheckbookError::Rule)?;

    let check_id = check.id;
    let mut active: checks::ActiveModel = check.into();
    active.status = Set(CheckStatus::from(next));
    if let Some(cashbox) = cashbox {
        active.cashbox_id = Set(cashbox);
    }
    active.updated_at = Set(chrono::Utc::now().into());
    let updated = active.update(txn).await?;

    tracing::debug!(check = %check_id, from = %from, to = %next, "check transitioned");
    Ok(updated)
}
