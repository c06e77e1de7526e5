//! Posting repository: compiles receipts and payments into journals.
//!
//! For each voucher item the engine resolves a chart code by instrument
//! type through the three-tier chain (configured override, named settings
//! record, literal fallback code) and a detail from the instrument's own
//! handler Detail (cashbox, bank account, card reader) or the check's
//! beneficiary. One counter-line against the voucher counterparty balances
//! the journal. The journal write, the header stamp, the status advance,
//! and the check side effects commit together or not at all.

use std::collections::{HashMap, HashSet};

use daftar_core::posting::{
    self, CodeSlot, InstrumentLine, InstrumentType as CoreInstrument, VoucherKind,
    build_journal_items, resolve_code, validate_voucher,
};
use daftar_core::treasury::CheckStatus as CoreCheckStatus;
use daftar_shared::config::PostingOverrides;
use daftar_shared::types::{CodeNodeId, DetailId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    bank_accounts, card_readers, cashboxes, code_nodes, payment_items, payments, receipt_items,
    receipts,
    sea_orm_active_enums::{JournalStatus, VoucherStatus},
};
use crate::repositories::checkbook::{CheckbookError, find_check_locked, transition_check};
use crate::repositories::journal::{CreateJournalInput, JournalWithItems, insert_journal};
use crate::repositories::settings::{SettingValue, get_on as get_setting};
use crate::repositories::{MAX_SEQUENCE_ATTEMPTS, is_unique_violation};

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// A voucher or resolution rule was violated.
    #[error(transparent)]
    Rule(#[from] posting::PostingError),

    /// A check lookup or transition failed.
    #[error(transparent)]
    Check(#[from] CheckbookError),

    /// Voucher not found.
    #[error("Voucher not found: {0}")]
    NotFound(Uuid),

    /// A referenced instrument record is missing.
    #[error("{entity} not found: {id}")]
    InstrumentNotFound {
        /// Instrument kind ("cashbox", "bank account", "card reader").
        entity: &'static str,
        /// The missing record's id.
        id: Uuid,
    },

    /// The header's explicit counterparty code does not exist.
    #[error("Special code not found: {0}")]
    SpecialCodeNotFound(Uuid),

    /// Journal number allocation kept conflicting.
    #[error("Could not allocate a journal number after {0} attempts")]
    SequenceExhausted(usize),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of posting a voucher.
#[derive(Debug)]
pub struct PostingOutcome {
    /// The compiled journal with its items.
    pub journal: JournalWithItems,
    /// The posted voucher's id.
    pub voucher_id: Uuid,
    /// The posted voucher's sequential number.
    pub voucher_number: i64,
}

/// Posting repository.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
    overrides: PostingOverrides,
}

impl PostingRepository {
    /// Creates a new posting repository with the configured code overrides.
    #[must_use]
    pub const fn new(db: DatabaseConnection, overrides: PostingOverrides) -> Self {
        Self { db, overrides }
    }

    /// Compiles a receipt into a balanced journal: one debit line per
    /// instrument item, one credit counter-line sized to the header total.
    pub async fn post_receipt(
        &self,
        receipt_id: Uuid,
        posted_by: Uuid,
    ) -> Result<PostingOutcome, PostingError> {
        for attempt in 0..MAX_SEQUENCE_ATTEMPTS {
            let txn = self.db.begin().await?;

            let header = receipts::Entity::find_by_id(receipt_id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or(PostingError::NotFound(receipt_id))?;
            let items = receipt_items::Entity::find()
                .filter(receipt_items::Column::ReceiptId.eq(receipt_id))
                .order_by_asc(receipt_items::Column::Position)
                .all(&txn)
                .await?;

            let pairs: Vec<(CoreInstrument, Decimal)> = items
                .iter()
                .map(|i| (i.instrument_type.clone().into(), i.amount))
                .collect();
            validate_voucher(
                VoucherKind::Receipt,
                header.status.clone().into(),
                header.total_amount,
                &pairs,
                header.cashbox_id.is_some(),
            )?;

            let slots = self
                .resolve_slots(
                    &txn,
                    header.organization_id,
                    VoucherKind::Receipt,
                    &pairs,
                    header.special_code_id.is_none(),
                )
                .await?;

            let counterparty_code = match header.special_code_id {
                Some(special) => verify_code(&txn, header.organization_id, special)
                    .await?
                    .ok_or(PostingError::SpecialCodeNotFound(special))?,
                None => slots[&CodeSlot::Counterparty],
            };

            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                let instrument: CoreInstrument = item.instrument_type.clone().into();
                let detail_id = self
                    .instrument_detail(
                        &txn,
                        instrument,
                        header.cashbox_id,
                        item.bank_account_id,
                        item.card_reader_id,
                        item.check_id,
                    )
                    .await?;

                lines.push(InstrumentLine {
                    instrument,
                    amount: item.amount,
                    code_id: slots[&CodeSlot::for_instrument(instrument)],
                    detail_id: detail_id.map(DetailId::from_uuid),
                    description: item.reference.clone(),
                });
            }

            let journal_items = build_journal_items(
                VoucherKind::Receipt,
                &lines,
                counterparty_code,
                DetailId::from_uuid(header.detail_id),
                header.total_amount,
                Some(format!("Receipt {}", header.number)),
            );

            let journal_result = insert_journal(
                &txn,
                &CreateJournalInput {
                    organization_id: header.organization_id,
                    fiscal_year_id: header.fiscal_year_id,
                    journal_date: header.receipt_date,
                    description: Some(format!("Receipt {}", header.number)),
                    items: journal_items,
                    created_by: posted_by,
                },
                JournalStatus::Draft,
                None,
            )
            .await;

            let journal = match journal_result {
                Ok(journal) => journal,
                Err(err) if is_unique_violation(&err) => {
                    drop(txn);
                    tracing::debug!(attempt, "journal number conflict, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            // Any incoming check not yet deposited moves into the cashbox.
            for item in &items {
                let Some(check_id) = item.check_id else {
                    continue;
                };
                let check = find_check_locked(&txn, check_id).await?;
                if check.status == crate::entities::sea_orm_active_enums::CheckStatus::Created {
                    transition_check(
                        &txn,
                        check,
                        CoreCheckStatus::InCashbox,
                        Some(header.cashbox_id),
                    )
                    .await?;
                }
            }

            let number = header.number;
            let mut active: receipts::ActiveModel = header.into();
            active.journal_id = Set(Some(journal.journal.id));
            active.status = Set(VoucherStatus::Sent);
            active.updated_at = Set(chrono::Utc::now().into());
            active.update(&txn).await?;

            txn.commit().await?;
            tracing::info!(
                receipt = %receipt_id,
                journal = %journal.journal.id,
                "receipt posted"
            );
            return Ok(PostingOutcome {
                journal,
                voucher_id: receipt_id,
                voucher_number: number,
            });
        }

        Err(PostingError::SequenceExhausted(MAX_SEQUENCE_ATTEMPTS))
    }

    /// Compiles a payment into a balanced journal: one credit line per
    /// instrument item, one debit counter-line sized to the header total.
    pub async fn post_payment(
        &self,
        payment_id: Uuid,
        posted_by: Uuid,
    ) -> Result<PostingOutcome, PostingError> {
        for attempt in 0..MAX_SEQUENCE_ATTEMPTS {
            let txn = self.db.begin().await?;

            let header = payments::Entity::find_by_id(payment_id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or(PostingError::NotFound(payment_id))?;
            let items = payment_items::Entity::find()
                .filter(payment_items::Column::PaymentId.eq(payment_id))
                .order_by_asc(payment_items::Column::Position)
                .all(&txn)
                .await?;

            let pairs: Vec<(CoreInstrument, Decimal)> = items
                .iter()
                .map(|i| (i.instrument_type.clone().into(), i.amount))
                .collect();
            validate_voucher(
                VoucherKind::Payment,
                header.status.clone().into(),
                header.total_amount,
                &pairs,
                header.cashbox_id.is_some(),
            )?;

            let slots = self
                .resolve_slots(
                    &txn,
                    header.organization_id,
                    VoucherKind::Payment,
                    &pairs,
                    header.special_code_id.is_none(),
                )
                .await?;

            let counterparty_code = match header.special_code_id {
                Some(special) => verify_code(&txn, header.organization_id, special)
                    .await?
                    .ok_or(PostingError::SpecialCodeNotFound(special))?,
                None => slots[&CodeSlot::Counterparty],
            };

            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                let instrument: CoreInstrument = item.instrument_type.clone().into();
                let detail_id = self
                    .instrument_detail(
                        &txn,
                        instrument,
                        header.cashbox_id,
                        item.bank_account_id,
                        item.card_reader_id,
                        item.check_id,
                    )
                    .await?;

                lines.push(InstrumentLine {
                    instrument,
                    amount: item.amount,
                    code_id: slots[&CodeSlot::for_instrument(instrument)],
                    detail_id: detail_id.map(DetailId::from_uuid),
                    description: item.reference.clone(),
                });
            }

            let journal_items = build_journal_items(
                VoucherKind::Payment,
                &lines,
                counterparty_code,
                DetailId::from_uuid(header.detail_id),
                header.total_amount,
                Some(format!("Payment {}", header.number)),
            );

            let journal_result = insert_journal(
                &txn,
                &CreateJournalInput {
                    organization_id: header.organization_id,
                    fiscal_year_id: header.fiscal_year_id,
                    journal_date: header.payment_date,
                    description: Some(format!("Payment {}", header.number)),
                    items: journal_items,
                    created_by: posted_by,
                },
                JournalStatus::Draft,
                None,
            )
            .await;

            let journal = match journal_result {
                Ok(journal) => journal,
                Err(err) if is_unique_violation(&err) => {
                    drop(txn);
                    tracing::debug!(attempt, "journal number conflict, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            // Any referenced check not yet spent is consumed now.
            for item in &items {
                let Some(check_id) = item.check_id else {
                    continue;
                };
                let check = find_check_locked(&txn, check_id).await?;
                let status: CoreCheckStatus = check.status.clone().into();
                if status != CoreCheckStatus::Spent {
                    transition_check(&txn, check, CoreCheckStatus::Spent, None).await?;
                }
            }

            let number = header.number;
            let mut active: payments::ActiveModel = header.into();
            active.journal_id = Set(Some(journal.journal.id));
            active.status = Set(VoucherStatus::Sent);
            active.updated_at = Set(chrono::Utc::now().into());
            active.update(&txn).await?;

            txn.commit().await?;
            tracing::info!(
                payment = %payment_id,
                journal = %journal.journal.id,
                "payment posted"
            );
            return Ok(PostingOutcome {
                journal,
                voucher_id: payment_id,
                voucher_number: number,
            });
        }

        Err(PostingError::SequenceExhausted(MAX_SEQUENCE_ATTEMPTS))
    }

    /// Resolves the chart codes for every slot the voucher needs.
    ///
    /// Candidate identifiers from the override and settings tiers are
    /// verified in one query; literal fallback codes are looked up in
    /// another. The per-slot chain itself is pure.
    async fn resolve_slots(
        &self,
        txn: &DatabaseTransaction,
        organization_id: Uuid,
        kind: VoucherKind,
        pairs: &[(CoreInstrument, Decimal)],
        need_counterparty: bool,
    ) -> Result<HashMap<CodeSlot, CodeNodeId>, PostingError> {
        let mut needed: Vec<CodeSlot> = Vec::new();
        for (instrument, _) in pairs {
            let slot = CodeSlot::for_instrument(*instrument);
            if !needed.contains(&slot) {
                needed.push(slot);
            }
        }
        if need_counterparty && !needed.contains(&CodeSlot::Counterparty) {
            needed.push(CodeSlot::Counterparty);
        }

        // Tier 2 candidates: named settings records.
        let mut setting_refs: HashMap<&'static str, Uuid> = HashMap::new();
        for slot in &needed {
            let key = slot.setting_key(kind);
            if let Some(SettingValue::Code(id)) = get_setting(txn, organization_id, key)
                .await
                .map_err(|err| match err {
                    crate::repositories::settings::SettingsError::Database(db) => {
                        PostingError::Database(db)
                    }
                })?
            {
                setting_refs.insert(key, id);
            }
        }

        // Verify override and settings candidates in one query.
        let mut candidates: Vec<Uuid> = setting_refs.values().copied().collect();
        for slot in &needed {
            if let Some(id) = override_for(&self.overrides, *slot) {
                candidates.push(id);
            }
        }
        let existing: HashSet<Uuid> = if candidates.is_empty() {
            HashSet::new()
        } else {
            code_nodes::Entity::find()
                .filter(code_nodes::Column::OrganizationId.eq(organization_id))
                .filter(code_nodes::Column::IsActive.eq(true))
                .filter(code_nodes::Column::Id.is_in(candidates))
                .all(txn)
                .await?
                .into_iter()
                .map(|n| n.id)
                .collect()
        };

        // Tier 3 candidates: literal fallback codes.
        let fallback_values: Vec<String> = needed
            .iter()
            .map(|slot| slot.fallback_code(kind).to_string())
            .collect();
        let literal_map: HashMap<String, Uuid> = code_nodes::Entity::find()
            .filter(code_nodes::Column::OrganizationId.eq(organization_id))
            .filter(code_nodes::Column::IsActive.eq(true))
            .filter(code_nodes::Column::Code.is_in(fallback_values))
            .all(txn)
            .await?
            .into_iter()
            .map(|n| (n.code, n.id))
            .collect();

        let mut resolved = HashMap::new();
        for slot in needed {
            let code_id = resolve_code(
                slot,
                kind,
                override_for(&self.overrides, slot).map(CodeNodeId::from_uuid),
                |id| existing.contains(&id.into_inner()),
                |key| setting_refs.get(key).copied().map(CodeNodeId::from_uuid),
                |value| literal_map.get(value).copied().map(CodeNodeId::from_uuid),
            )?;
            resolved.insert(slot, code_id);
        }

        Ok(resolved)
    }

    /// Resolves the ledger detail for one voucher item: the instrument's
    /// handler Detail, or the check's beneficiary detail.
    async fn instrument_detail(
        &self,
        txn: &DatabaseTransaction,
        instrument: CoreInstrument,
        header_cashbox: Option<Uuid>,
        bank_account_id: Option<Uuid>,
        card_reader_id: Option<Uuid>,
        check_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, PostingError> {
        match instrument {
            CoreInstrument::Cash => {
                let cashbox_id = header_cashbox.ok_or(PostingError::Rule(
                    posting::PostingError::CashboxRequired {
                        index: 0,
                        instrument,
                    },
                ))?;
                let cashbox = cashboxes::Entity::find_by_id(cashbox_id)
                    .one(txn)
                    .await?
                    .ok_or(PostingError::InstrumentNotFound {
                        entity: "cashbox",
                        id: cashbox_id,
                    })?;
                Ok(Some(cashbox.handler_detail_id))
            }
            CoreInstrument::Card => {
                let reader_id =
                    card_reader_id.ok_or(posting_target_missing(instrument))?;
                let reader = card_readers::Entity::find_by_id(reader_id)
                    .one(txn)
                    .await?
                    .ok_or(PostingError::InstrumentNotFound {
                        entity: "card reader",
                        id: reader_id,
                    })?;
                Ok(Some(reader.handler_detail_id))
            }
            CoreInstrument::Transfer => {
                let account_id =
                    bank_account_id.ok_or(posting_target_missing(instrument))?;
                let account = bank_accounts::Entity::find_by_id(account_id)
                    .one(txn)
                    .await?
                    .ok_or(PostingError::InstrumentNotFound {
                        entity: "bank account",
                        id: account_id,
                    })?;
                Ok(Some(account.handler_detail_id))
            }
            CoreInstrument::Check | CoreInstrument::Checkin => {
                let check_id = check_id.ok_or(posting_target_missing(instrument))?;
                let check = find_check_locked(txn, check_id).await?;
                Ok(check.beneficiary_detail_id)
            }
        }
    }
}

const fn posting_target_missing(instrument: CoreInstrument) -> PostingError {
    PostingError::Rule(posting::PostingError::MissingInstrumentTarget {
        index: 0,
        instrument,
    })
}

/// Verifies that a code node exists, is active, and belongs to the
/// organization.
async fn verify_code(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    id: Uuid,
) -> Result<Option<CodeNodeId>, PostingError> {
    Ok(code_nodes::Entity::find_by_id(id)
        .filter(code_nodes::Column::OrganizationId.eq(organization_id))
        .filter(code_nodes::Column::IsActive.eq(true))
        .one(txn)
        .await?
        .map(|n| CodeNodeId::from_uuid(n.id)))
}

fn override_for(overrides: &PostingOverrides, slot: CodeSlot) -> Option<Uuid> {
    match slot {
        CodeSlot::Cash => overrides.cash_code_id,
        CodeSlot::Card => overrides.card_code_id,
        CodeSlot::Transfer => overrides.transfer_code_id,
        CodeSlot::Check => overrides.check_code_id,
        CodeSlot::Counterparty => overrides.counterparty_code_id,
    }
}
