//! Receipt repository.
//!
//! Receipts record incoming money split across instruments. Saving one is
//! what drives incoming checks through the deposit half of their state
//! machine: items that add a check move it `created → incashbox` (stamping
//! the receipt's cashbox onto it), and a re-save that sheds a check reverts
//! it only when no other receipt item still references it.

use chrono::NaiveDate;
use daftar_core::posting::{InstrumentType as CoreInstrument, VoucherKind, VoucherStatus};
use daftar_core::treasury::CheckStatus as CoreCheckStatus;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::entities::{
    receipt_items, receipts,
    sea_orm_active_enums::{CheckKind, InstrumentType, VoucherStatus as DbVoucherStatus},
};
use crate::repositories::checkbook::{CheckbookError, find_check_locked, transition_check};
use crate::repositories::{MAX_SEQUENCE_ATTEMPTS, is_unique_violation};

/// Error types for receipt operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    /// A check lookup or transition failed.
    #[error(transparent)]
    Check(#[from] CheckbookError),

    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    NotFound(Uuid),

    /// Receipt has been posted and can no longer change.
    #[error("Receipt is {0:?} and can no longer change")]
    NotEditable(VoucherStatus),

    /// An instrument is not allowed on receipts.
    #[error("Item {index} has instrument {instrument}, not allowed on receipts")]
    InstrumentNotAllowed {
        /// Zero-based position of the offending item.
        index: usize,
        /// The offending instrument type.
        instrument: CoreInstrument,
    },

    /// Cash-handled items require a cashbox on the header.
    #[error("Item {index} ({instrument}) requires a cashbox on the header")]
    CashboxRequired {
        /// Zero-based position of the offending item.
        index: usize,
        /// The instrument that needs a cashbox.
        instrument: CoreInstrument,
    },

    /// A check item references a check of the wrong direction.
    #[error("Check {check} is not an incoming check")]
    WrongCheckKind {
        /// The referenced check.
        check: Uuid,
    },

    /// A check item is missing its check reference.
    #[error("Item {index} (check) is missing its check reference")]
    MissingCheckReference {
        /// Zero-based position of the offending item.
        index: usize,
    },

    /// Sequential number allocation kept conflicting.
    #[error("Could not allocate a receipt number after {0} attempts")]
    SequenceExhausted(usize),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// One voucher line in save input.
#[derive(Debug, Clone)]
pub struct SaveVoucherItemInput {
    /// Instrument type.
    pub instrument: CoreInstrument,
    /// Line amount.
    pub amount: Decimal,
    /// Bank account, for transfer items.
    pub bank_account_id: Option<Uuid>,
    /// Card reader, for card items.
    pub card_reader_id: Option<Uuid>,
    /// Check, for check/checkin items.
    pub check_id: Option<Uuid>,
    /// Free-form tracking reference.
    pub reference: Option<String>,
    /// Ordering position.
    pub position: i32,
}

/// Input for saving a receipt (create or full re-save).
#[derive(Debug, Clone)]
pub struct SaveReceiptInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Document date.
    pub receipt_date: NaiveDate,
    /// Fiscal year the receipt belongs to.
    pub fiscal_year_id: Uuid,
    /// Counterparty detail.
    pub detail_id: Uuid,
    /// Optional explicit counterparty code.
    pub special_code_id: Option<Uuid>,
    /// Cashbox handling cash and deposited checks.
    pub cashbox_id: Option<Uuid>,
    /// Stated total; the posting engine validates it against the item sum.
    pub total_amount: Decimal,
    /// Header description.
    pub description: Option<String>,
    /// Voucher lines.
    pub items: Vec<SaveVoucherItemInput>,
    /// Caller identity for the audit trail.
    pub created_by: Uuid,
}

/// A receipt with its items.
#[derive(Debug, Clone)]
pub struct ReceiptWithItems {
    /// Receipt header.
    pub receipt: receipts::Model,
    /// Voucher lines.
    pub items: Vec<receipt_items::Model>,
}

/// Receipt repository.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft receipt, moving any referenced incoming checks into
    /// the cashbox in the same transaction.
    pub async fn create(&self, input: SaveReceiptInput) -> Result<ReceiptWithItems, ReceiptError> {
        validate_items(&input)?;

        for attempt in 0..MAX_SEQUENCE_ATTEMPTS {
            let txn = self.db.begin().await?;

            let number = next_number(&txn, input.organization_id).await?;
            let now = chrono::Utc::now().into();
            let header_result = receipts::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(input.organization_id),
                number: Set(number),
                status: Set(DbVoucherStatus::Draft),
                receipt_date: Set(input.receipt_date),
                fiscal_year_id: Set(input.fiscal_year_id),
                detail_id: Set(input.detail_id),
                special_code_id: Set(input.special_code_id),
                cashbox_id: Set(input.cashbox_id),
                total_amount: Set(input.total_amount),
                journal_id: Set(None),
                description: Set(input.description.clone()),
                created_by: Set(input.created_by),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await;

            let header = match header_result {
                Ok(header) => header,
                Err(err) if is_unique_violation(&err) => {
                    drop(txn);
                    tracing::debug!(attempt, "receipt number conflict, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let items = insert_items(&txn, header.id, &input.items).await?;
            attach_checks(&txn, &input.items, input.cashbox_id).await?;

            txn.commit().await?;
            return Ok(ReceiptWithItems {
                receipt: header,
                items,
            });
        }

        Err(ReceiptError::SequenceExhausted(MAX_SEQUENCE_ATTEMPTS))
    }

    /// Re-saves a draft receipt with a new item set.
    ///
    /// Checks referenced by the previous save but absent from the new one
    /// revert `incashbox → created` only when no other receipt item still
    /// references them; newly referenced checks are deposited.
    pub async fn update(
        &self,
        id: Uuid,
        input: SaveReceiptInput,
    ) -> Result<ReceiptWithItems, ReceiptError> {
        validate_items(&input)?;

        let txn = self.db.begin().await?;

        let header = find_locked(&txn, id).await?;
        ensure_draft(&header)?;

        let previous_checks = linked_checks(&txn, id).await?;
        let next_checks: HashSet<Uuid> =
            input.items.iter().filter_map(|i| i.check_id).collect();

        receipt_items::Entity::delete_many()
            .filter(receipt_items::Column::ReceiptId.eq(id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, id, &input.items).await?;

        // Revert shed checks, unless another receipt still holds them.
        for check_id in previous_checks.difference(&next_checks) {
            if reference_count_elsewhere(&txn, *check_id, id).await? == 0 {
                let check = find_check_locked(&txn, *check_id).await?;
                if CoreCheckStatus::from(check.status.clone()) == CoreCheckStatus::InCashbox {
                    transition_check(&txn, check, CoreCheckStatus::Created, Some(None)).await?;
                }
            }
        }

        // Deposit newly attached checks.
        let added: Vec<SaveVoucherItemInput> = input
            .items
            .iter()
            .filter(|i| {
                i.check_id
                    .is_some_and(|check| !previous_checks.contains(&check))
            })
            .cloned()
            .collect();
        attach_checks(&txn, &added, input.cashbox_id).await?;

        let mut active: receipts::ActiveModel = header.into();
        active.receipt_date = Set(input.receipt_date);
        active.fiscal_year_id = Set(input.fiscal_year_id);
        active.detail_id = Set(input.detail_id);
        active.special_code_id = Set(input.special_code_id);
        active.cashbox_id = Set(input.cashbox_id);
        active.total_amount = Set(input.total_amount);
        active.description = Set(input.description.clone());
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(ReceiptWithItems {
            receipt: updated,
            items,
        })
    }

    /// Deletes a draft receipt, reverting any checks it held.
    pub async fn delete(&self, id: Uuid) -> Result<(), ReceiptError> {
        let txn = self.db.begin().await?;

        let header = find_locked(&txn, id).await?;
        ensure_draft(&header)?;

        for check_id in linked_checks(&txn, id).await? {
            if reference_count_elsewhere(&txn, check_id, id).await? == 0 {
                let check = find_check_locked(&txn, check_id).await?;
                if CoreCheckStatus::from(check.status.clone()) == CoreCheckStatus::InCashbox {
                    transition_check(&txn, check, CoreCheckStatus::Created, Some(None)).await?;
                }
            }
        }

        receipt_items::Entity::delete_many()
            .filter(receipt_items::Column::ReceiptId.eq(id))
            .exec(&txn)
            .await?;
        receipts::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Fetches a receipt with its items.
    pub async fn get_with_items(&self, id: Uuid) -> Result<ReceiptWithItems, ReceiptError> {
        let receipt = receipts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ReceiptError::NotFound(id))?;
        let items = load_items(&self.db, id).await?;

        Ok(ReceiptWithItems { receipt, items })
    }

    /// Lists receipts for a fiscal year, newest number first.
    pub async fn list_for_year(
        &self,
        fiscal_year_id: Uuid,
    ) -> Result<Vec<receipts::Model>, ReceiptError> {
        Ok(receipts::Entity::find()
            .filter(receipts::Column::FiscalYearId.eq(fiscal_year_id))
            .order_by_desc(receipts::Column::Number)
            .all(&self.db)
            .await?)
    }
}

/// Validates instrument/cashbox rules for receipt items.
fn validate_items(input: &SaveReceiptInput) -> Result<(), ReceiptError> {
    for (index, item) in input.items.iter().enumerate() {
        if !item.instrument.allowed_on(VoucherKind::Receipt) {
            return Err(ReceiptError::InstrumentNotAllowed {
                index,
                instrument: item.instrument,
            });
        }
        if item.instrument.requires_cashbox(VoucherKind::Receipt) && input.cashbox_id.is_none() {
            return Err(ReceiptError::CashboxRequired {
                index,
                instrument: item.instrument,
            });
        }
        if item.instrument == CoreInstrument::Check && item.check_id.is_none() {
            return Err(ReceiptError::MissingCheckReference { index });
        }
    }
    Ok(())
}

/// Deposits the incoming checks referenced by the given items, stamping the
/// receipt's cashbox onto them.
async fn attach_checks(
    txn: &DatabaseTransaction,
    items: &[SaveVoucherItemInput],
    cashbox_id: Option<Uuid>,
) -> Result<(), ReceiptError> {
    for item in items {
        let Some(check_id) = item.check_id else {
            continue;
        };

        let check = find_check_locked(txn, check_id).await?;
        if check.kind != CheckKind::Incoming {
            return Err(ReceiptError::WrongCheckKind { check: check_id });
        }
        transition_check(txn, check, CoreCheckStatus::InCashbox, Some(cashbox_id)).await?;
    }
    Ok(())
}

/// Check ids referenced by a receipt's current items.
async fn linked_checks(
    txn: &DatabaseTransaction,
    receipt_id: Uuid,
) -> Result<HashSet<Uuid>, DbErr> {
    Ok(receipt_items::Entity::find()
        .filter(receipt_items::Column::ReceiptId.eq(receipt_id))
        .all(txn)
        .await?
        .into_iter()
        .filter_map(|i| i.check_id)
        .collect())
}

/// Counts receipt items referencing a check outside the given receipt.
async fn reference_count_elsewhere(
    txn: &DatabaseTransaction,
    check_id: Uuid,
    receipt_id: Uuid,
) -> Result<u64, DbErr> {
    receipt_items::Entity::find()
        .filter(receipt_items::Column::CheckId.eq(check_id))
        .filter(receipt_items::Column::ReceiptId.ne(receipt_id))
        .count(txn)
        .await
}

async fn next_number(txn: &DatabaseTransaction, organization_id: Uuid) -> Result<i64, DbErr> {
    let last = receipts::Entity::find()
        .filter(receipts::Column::OrganizationId.eq(organization_id))
        .order_by_desc(receipts::Column::Number)
        .one(txn)
        .await?;
    Ok(last.map_or(1, |r| r.number + 1))
}

async fn insert_items(
    txn: &DatabaseTransaction,
    receipt_id: Uuid,
    items: &[SaveVoucherItemInput],
) -> Result<Vec<receipt_items::Model>, DbErr> {
    let now = chrono::Utc::now().into();
    let mut inserted = Vec::with_capacity(items.len());

    for item in items {
        let model = receipt_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt_id),
            instrument_type: Set(InstrumentType::from(item.instrument)),
            amount: Set(item.amount),
            bank_account_id: Set(item.bank_account_id),
            card_reader_id: Set(item.card_reader_id),
            check_id: Set(item.check_id),
            reference: Set(item.reference.clone()),
            position: Set(item.position),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;
        inserted.push(model);
    }

    Ok(inserted)
}

async fn find_locked(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<receipts::Model, ReceiptError> {
    receipts::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(ReceiptError::NotFound(id))
}

fn ensure_draft(header: &receipts::Model) -> Result<(), ReceiptError> {
    let status: VoucherStatus = header.status.clone().into();
    if status.is_editable() {
        Ok(())
    } else {
        Err(ReceiptError::NotEditable(status))
    }
}

async fn load_items<C: sea_orm::ConnectionTrait>(
    conn: &C,
    receipt_id: Uuid,
) -> Result<Vec<receipt_items::Model>, DbErr> {
    receipt_items::Entity::find()
        .filter(receipt_items::Column::ReceiptId.eq(receipt_id))
        .order_by_asc(receipt_items::Column::Position)
        .all(conn)
        .await
}
