//! Payment repository.
//!
//! Payments record outgoing money split across instruments. Saving one
//! drives the spend half of the check state machine: a `checkin` item
//! consumes an in-cashbox incoming check, a `check` item consumes an issued
//! outgoing check, and a re-save or delete that sheds such an item reverts
//! the check to its unspent state.

use chrono::NaiveDate;
use daftar_core::posting::{InstrumentType as CoreInstrument, VoucherKind, VoucherStatus};
use daftar_core::treasury::{CheckStatus as CoreCheckStatus, check::CheckKind as CoreCheckKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::entities::{
    payment_items, payments,
    sea_orm_active_enums::{CheckKind, InstrumentType, VoucherStatus as DbVoucherStatus},
};
use crate::repositories::checkbook::{CheckbookError, find_check_locked, transition_check};
use crate::repositories::receipt::SaveVoucherItemInput;
use crate::repositories::{MAX_SEQUENCE_ATTEMPTS, is_unique_violation};

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// A check lookup or transition failed.
    #[error(transparent)]
    Check(#[from] CheckbookError),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// Payment has been posted and can no longer change.
    #[error("Payment is {0:?} and can no longer change")]
    NotEditable(VoucherStatus),

    /// An instrument is not allowed on payments.
    #[error("Item {index} has instrument {instrument}, not allowed on payments")]
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
    #[error("Check {check} has the wrong direction for a {instrument} item")]
    WrongCheckKind {
        /// The referenced check.
        check: Uuid,
        /// The item instrument that rejected it.
        instrument: CoreInstrument,
    },

    /// A check/checkin item is missing its check reference.
    #[error("Item {index} ({instrument}) is missing its check reference")]
    MissingCheckReference {
        /// Zero-based position of the offending item.
        index: usize,
        /// The instrument missing its reference.
        instrument: CoreInstrument,
    },

    /// Sequential number allocation kept conflicting.
    #[error("Could not allocate a payment number after {0} attempts")]
    SequenceExhausted(usize),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for saving a payment (create or full re-save).
#[derive(Debug, Clone)]
pub struct SavePaymentInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Document date.
    pub payment_date: NaiveDate,
    /// Fiscal year the payment belongs to.
    pub fiscal_year_id: Uuid,
    /// Counterparty detail.
    pub detail_id: Uuid,
    /// Optional explicit counterparty code.
    pub special_code_id: Option<Uuid>,
    /// Cashbox handling cash and spent incoming checks.
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

/// A payment with its items.
#[derive(Debug, Clone)]
pub struct PaymentWithItems {
    /// Payment header.
    pub payment: payments::Model,
    /// Voucher lines.
    pub items: Vec<payment_items::Model>,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft payment, spending any referenced checks in the same
    /// transaction.
    pub async fn create(&self, input: SavePaymentInput) -> Result<PaymentWithItems, PaymentError> {
        validate_items(&input)?;

        for attempt in 0..MAX_SEQUENCE_ATTEMPTS {
            let txn = self.db.begin().await?;

            let number = next_number(&txn, input.organization_id).await?;
            let now = chrono::Utc::now().into();
            let header_result = payments::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(input.organization_id),
                number: Set(number),
                status: Set(DbVoucherStatus::Draft),
                payment_date: Set(input.payment_date),
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
                    tracing::debug!(attempt, "payment number conflict, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let items = insert_items(&txn, header.id, &input.items).await?;
            spend_checks(&txn, &input.items).await?;

            txn.commit().await?;
            return Ok(PaymentWithItems {
                payment: header,
                items,
            });
        }

        Err(PaymentError::SequenceExhausted(MAX_SEQUENCE_ATTEMPTS))
    }

    /// Re-saves a draft payment with a new item set.
    ///
    /// Checks spent by the previous save but absent from the new one revert
    /// `spent → incashbox` (checkin) or `spent → issued` (outgoing check);
    /// newly referenced checks are spent.
    pub async fn update(
        &self,
        id: Uuid,
        input: SavePaymentInput,
    ) -> Result<PaymentWithItems, PaymentError> {
        validate_items(&input)?;

        let txn = self.db.begin().await?;

        let header = find_locked(&txn, id).await?;
        ensure_draft(&header)?;

        let previous_checks = linked_checks(&txn, id).await?;
        let next_checks: HashSet<Uuid> =
            input.items.iter().filter_map(|i| i.check_id).collect();

        payment_items::Entity::delete_many()
            .filter(payment_items::Column::PaymentId.eq(id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, id, &input.items).await?;

        // Revert shed checks to their unspent state.
        for check_id in previous_checks.difference(&next_checks) {
            unspend_check(&txn, *check_id).await?;
        }

        // Spend newly attached checks.
        let added: Vec<SaveVoucherItemInput> = input
            .items
            .iter()
            .filter(|i| {
                i.check_id
                    .is_some_and(|check| !previous_checks.contains(&check))
            })
            .cloned()
            .collect();
        spend_checks(&txn, &added).await?;

        let mut active: payments::ActiveModel = header.into();
        active.payment_date = Set(input.payment_date);
        active.fiscal_year_id = Set(input.fiscal_year_id);
        active.detail_id = Set(input.detail_id);
        active.special_code_id = Set(input.special_code_id);
        active.cashbox_id = Set(input.cashbox_id);
        active.total_amount = Set(input.total_amount);
        active.description = Set(input.description.clone());
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(PaymentWithItems {
            payment: updated,
            items,
        })
    }

    /// Deletes a draft payment, reverting any checks it spent.
    pub async fn delete(&self, id: Uuid) -> Result<(), PaymentError> {
        let txn = self.db.begin().await?;

        let header = find_locked(&txn, id).await?;
        ensure_draft(&header)?;

        for check_id in linked_checks(&txn, id).await? {
            unspend_check(&txn, check_id).await?;
        }

        payment_items::Entity::delete_many()
            .filter(payment_items::Column::PaymentId.eq(id))
            .exec(&txn)
            .await?;
        payments::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Fetches a payment with its items.
    pub async fn get_with_items(&self, id: Uuid) -> Result<PaymentWithItems, PaymentError> {
        let payment = payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(id))?;
        let items = load_items(&self.db, id).await?;

        Ok(PaymentWithItems { payment, items })
    }

    /// Lists payments for a fiscal year, newest number first.
    pub async fn list_for_year(
        &self,
        fiscal_year_id: Uuid,
    ) -> Result<Vec<payments::Model>, PaymentError> {
        Ok(payments::Entity::find()
            .filter(payments::Column::FiscalYearId.eq(fiscal_year_id))
            .order_by_desc(payments::Column::Number)
            .all(&self.db)
            .await?)
    }
}

/// Validates instrument/cashbox rules for payment items.
fn validate_items(input: &SavePaymentInput) -> Result<(), PaymentError> {
    for (index, item) in input.items.iter().enumerate() {
        if !item.instrument.allowed_on(VoucherKind::Payment) {
            return Err(PaymentError::InstrumentNotAllowed {
                index,
                instrument: item.instrument,
            });
        }
        if item.instrument.requires_cashbox(VoucherKind::Payment) && input.cashbox_id.is_none() {
            return Err(PaymentError::CashboxRequired {
                index,
                instrument: item.instrument,
            });
        }
        let needs_check = matches!(
            item.instrument,
            CoreInstrument::Check | CoreInstrument::Checkin
        );
        if needs_check && item.check_id.is_none() {
            return Err(PaymentError::MissingCheckReference {
                index,
                instrument: item.instrument,
            });
        }
    }
    Ok(())
}

/// Spends the checks referenced by the given items: checkin items consume
/// in-cashbox incoming checks, check items consume issued outgoing checks.
async fn spend_checks(
    txn: &DatabaseTransaction,
    items: &[SaveVoucherItemInput],
) -> Result<(), PaymentError> {
    for item in items {
        let Some(check_id) = item.check_id else {
            continue;
        };

        let check = find_check_locked(txn, check_id).await?;
        let expected_kind = match item.instrument {
            CoreInstrument::Checkin => CheckKind::Incoming,
            CoreInstrument::Check => CheckKind::Outgoing,
            _ => continue,
        };
        if check.kind != expected_kind {
            return Err(PaymentError::WrongCheckKind {
                check: check_id,
                instrument: item.instrument,
            });
        }

        transition_check(txn, check, CoreCheckStatus::Spent, None).await?;
    }
    Ok(())
}

/// Reverts a spent check to its kind's unspent state.
async fn unspend_check(txn: &DatabaseTransaction, check_id: Uuid) -> Result<(), PaymentError> {
    let check = find_check_locked(txn, check_id).await?;
    if CoreCheckStatus::from(check.status.clone()) != CoreCheckStatus::Spent {
        return Ok(());
    }

    let kind: CoreCheckKind = check.kind.clone().into();
    transition_check(txn, check, CoreCheckStatus::unspent_status(kind), None).await?;
    Ok(())
}

/// Check ids referenced by a payment's current items.
async fn linked_checks(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
) -> Result<HashSet<Uuid>, DbErr> {
    Ok(payment_items::Entity::find()
        .filter(payment_items::Column::PaymentId.eq(payment_id))
        .all(txn)
        .await?
        .into_iter()
        .filter_map(|i| i.check_id)
        .collect())
}

async fn next_number(txn: &DatabaseTransaction, organization_id: Uuid) -> Result<i64, DbErr> {
    let last = payments::Entity::find()
        .filter(payments::Column::OrganizationId.eq(organization_id))
        .order_by_desc(payments::Column::Number)
        .one(txn)
        .await?;
    Ok(last.map_or(1, |p| p.number + 1))
}

async fn insert_items(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
    items: &[SaveVoucherItemInput],
) -> Result<Vec<payment_items::Model>, DbErr> {
    let now = chrono::Utc::now().into();
    let mut inserted = Vec::with_capacity(items.len());

    for item in items {
        let model = payment_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            payment_id: Set(payment_id),
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
) -> Result<payments::Model, PaymentError> {
    payments::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(PaymentError::NotFound(id))
}

fn ensure_draft(header: &payments::Model) -> Result<(), PaymentError> {
    let status: VoucherStatus = header.status.clone().into();
    if status.is_editable() {
        Ok(())
    } else {
        Err(PaymentError::NotEditable(status))
    }
}

async fn load_items<C: sea_orm::ConnectionTrait>(
    conn: &C,
    payment_id: Uuid,
) -> Result<Vec<payment_items::Model>, DbErr> {
    payment_items::Entity::find()
        .filter(payment_items::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_items::Column::Position)
        .all(conn)
        .await
}
