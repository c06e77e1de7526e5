//! Treasury instrument repository: banks, bank accounts, card readers, and
//! cashboxes.
//!
//! Creating a bank account, card reader, or cashbox allocates the next free
//! four-digit code from the class's configured offset and creates the linked
//! system-managed Detail in the same transaction, retrying on code collision
//! (bounded) before failing. Deleting the owning instrument deletes the
//! Detail, or soft-disables it when referenced elsewhere.

use chrono::NaiveDate;
use daftar_core::catalog::{self, MAX_CODE_ALLOCATION_ATTEMPTS, next_free_code};
use daftar_core::treasury::InstrumentClass;
use daftar_shared::config::NumberingConfig;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    bank_accounts, banks, card_readers, cashboxes, checkbooks, details,
    sea_orm_active_enums::DetailKind,
};
use crate::repositories::detail::{insert_detail, reference_count, used_codes};
use crate::repositories::is_unique_violation;

/// Error types for treasury instrument operations.
#[derive(Debug, thiserror::Error)]
pub enum TreasuryError {
    /// A catalogue rule was violated during handler allocation.
    #[error(transparent)]
    Rule(#[from] catalog::CatalogError),

    /// Instrument not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Instrument kind ("bank", "bank account", ...).
        entity: &'static str,
        /// The missing record's id.
        id: Uuid,
    },

    /// Instrument is referenced and cannot be deleted.
    #[error("{entity} {id} is referenced and cannot be deleted")]
    InUse {
        /// Instrument kind.
        entity: &'static str,
        /// The referenced record's id.
        id: Uuid,
    },

    /// Handler code allocation kept colliding.
    #[error("Could not allocate a handler detail code after {0} attempts")]
    NoCodesAvailable(usize),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a bank account.
#[derive(Debug, Clone)]
pub struct CreateBankAccountInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Owning bank.
    pub bank_id: Uuid,
    /// Display name.
    pub name: String,
    /// Account number at the bank.
    pub account_number: String,
}

/// Input for creating a card reader.
#[derive(Debug, Clone)]
pub struct CreateCardReaderInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Bank account the reader settles into.
    pub bank_account_id: Uuid,
    /// Display name.
    pub name: String,
}

/// Input for creating a cashbox.
#[derive(Debug, Clone)]
pub struct CreateCashboxInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Display name.
    pub name: String,
    /// Opening balance.
    pub starting_amount: Decimal,
    /// Date the opening balance was taken.
    pub starting_date: NaiveDate,
}

/// Treasury instrument repository.
#[derive(Debug, Clone)]
pub struct TreasuryRepository {
    db: DatabaseConnection,
    numbering: NumberingConfig,
}

impl TreasuryRepository {
    /// Creates a new treasury repository with the given numbering offsets.
    #[must_use]
    pub const fn new(db: DatabaseConnection, numbering: NumberingConfig) -> Self {
        Self { db, numbering }
    }

    // ========== Banks ==========

    /// Creates a bank.
    pub async fn create_bank(
        &self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<banks::Model, TreasuryError> {
        let now = chrono::Utc::now().into();
        Ok(banks::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?)
    }

    /// Deletes a bank with no accounts.
    pub async fn delete_bank(&self, id: Uuid) -> Result<(), TreasuryError> {
        let accounts = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::BankId.eq(id))
            .count(&self.db)
            .await?;
        if accounts > 0 {
            return Err(TreasuryError::InUse { entity: "bank", id });
        }

        banks::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Lists an organization's banks.
    pub async fn list_banks(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<banks::Model>, TreasuryError> {
        Ok(banks::Entity::find()
            .filter(banks::Column::OrganizationId.eq(organization_id))
            .order_by_asc(banks::Column::Name)
            .all(&self.db)
            .await?)
    }

    // ========== Bank accounts ==========

    /// Creates a bank account and its system-managed handler Detail in one
    /// transaction.
    pub async fn create_bank_account(
        &self,
        input: CreateBankAccountInput,
    ) -> Result<(bank_accounts::Model, details::Model), TreasuryError> {
        banks::Entity::find_by_id(input.bank_id)
            .one(&self.db)
            .await?
            .ok_or(TreasuryError::NotFound {
                entity: "bank",
                id: input.bank_id,
            })?;

        let (txn, detail) = self
            .begin_with_handler_detail(
                input.organization_id,
                InstrumentClass::BankAccount,
                &input.name,
            )
            .await?;

        let now = chrono::Utc::now().into();
        let account = bank_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            bank_id: Set(input.bank_id),
            name: Set(input.name),
            account_number: Set(input.account_number),
            handler_detail_id: Set(detail.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((account, detail))
    }

    /// Deletes a bank account, removing or soft-disabling its handler
    /// Detail in the same transaction.
    pub async fn delete_bank_account(&self, id: Uuid) -> Result<(), TreasuryError> {
        let account = bank_accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TreasuryError::NotFound {
                entity: "bank account",
                id,
            })?;

        let books = checkbooks::Entity::find()
            .filter(checkbooks::Column::BankAccountId.eq(id))
            .count(&self.db)
            .await?;
        let readers = card_readers::Entity::find()
            .filter(card_readers::Column::BankAccountId.eq(id))
            .count(&self.db)
            .await?;
        if books + readers > 0 {
            return Err(TreasuryError::InUse {
                entity: "bank account",
                id,
            });
        }

        let txn = self.db.begin().await?;
        bank_accounts::Entity::delete_by_id(id).exec(&txn).await?;
        drop_handler_detail(&txn, account.handler_detail_id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Lists an organization's bank accounts.
    pub async fn list_bank_accounts(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<bank_accounts::Model>, TreasuryError> {
        Ok(bank_accounts::Entity::find()
            .filter(bank_accounts::Column::OrganizationId.eq(organization_id))
            .order_by_asc(bank_accounts::Column::Name)
            .all(&self.db)
            .await?)
    }

    // ========== Card readers ==========

    /// Creates a card reader and its system-managed handler Detail in one
    /// transaction.
    pub async fn create_card_reader(
        &self,
        input: CreateCardReaderInput,
    ) -> Result<(card_readers::Model, details::Model), TreasuryError> {
        bank_accounts::Entity::find_by_id(input.bank_account_id)
            .one(&self.db)
            .await?
            .ok_or(TreasuryError::NotFound {
                entity: "bank account",
                id: input.bank_account_id,
            })?;

        let (txn, detail) = self
            .begin_with_handler_detail(
                input.organization_id,
                InstrumentClass::CardReader,
                &input.name,
            )
            .await?;

        let now = chrono::Utc::now().into();
        let reader = card_readers::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            bank_account_id: Set(input.bank_account_id),
            name: Set(input.name),
            handler_detail_id: Set(detail.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((reader, detail))
    }

    /// Deletes a card reader, removing or soft-disabling its handler Detail.
    pub async fn delete_card_reader(&self, id: Uuid) -> Result<(), TreasuryError> {
        let reader = card_readers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TreasuryError::NotFound {
                entity: "card reader",
                id,
            })?;

        let txn = self.db.begin().await?;
        card_readers::Entity::delete_by_id(id).exec(&txn).await?;
        drop_handler_detail(&txn, reader.handler_detail_id).await?;
        txn.commit().await?;
        Ok(())
    }

    // ========== Cashboxes ==========

    /// Creates a cashbox and its mirrored system-managed Detail in one
    /// transaction. The cashbox code equals the Detail code.
    pub async fn create_cashbox(
        &self,
        input: CreateCashboxInput,
    ) -> Result<(cashboxes::Model, details::Model), TreasuryError> {
        let (txn, detail) = self
            .begin_with_handler_detail(
                input.organization_id,
                InstrumentClass::Cashbox,
                &input.name,
            )
            .await?;

        let now = chrono::Utc::now().into();
        let cashbox = cashboxes::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            code: Set(detail.code.clone()),
            name: Set(input.name),
            handler_detail_id: Set(detail.id),
            starting_amount: Set(input.starting_amount),
            starting_date: Set(input.starting_date),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((cashbox, detail))
    }

    /// Renames a cashbox, keeping its Detail title in lockstep.
    pub async fn rename_cashbox(
        &self,
        id: Uuid,
        name: &str,
    ) -> Result<cashboxes::Model, TreasuryError> {
        let cashbox = cashboxes::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TreasuryError::NotFound {
                entity: "cashbox",
                id,
            })?;

        let txn = self.db.begin().await?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        if let Some(detail) = details::Entity::find_by_id(cashbox.handler_detail_id)
            .one(&txn)
            .await?
        {
            let mut active: details::ActiveModel = detail.into();
            active.title = Set(name.to_string());
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let mut active: cashboxes::ActiveModel = cashbox.into();
        active.name = Set(name.to_string());
        active.updated_at = Set(now);
        let renamed = active.update(&txn).await?;

        txn.commit().await?;
        Ok(renamed)
    }

    /// Deletes a cashbox, removing or soft-disabling its mirrored Detail in
    /// the same transaction.
    pub async fn delete_cashbox(&self, id: Uuid) -> Result<(), TreasuryError> {
        let cashbox = cashboxes::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TreasuryError::NotFound {
                entity: "cashbox",
                id,
            })?;

        let txn = self.db.begin().await?;
        cashboxes::Entity::delete_by_id(id).exec(&txn).await?;
        drop_handler_detail(&txn, cashbox.handler_detail_id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Lists an organization's cashboxes.
    pub async fn list_cashboxes(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<cashboxes::Model>, TreasuryError> {
        Ok(cashboxes::Entity::find()
            .filter(cashboxes::Column::OrganizationId.eq(organization_id))
            .order_by_asc(cashboxes::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Opens a transaction and allocates a system-managed handler Detail at
    /// the next free code for the class.
    ///
    /// Allocation is read-then-insert against the unique index on detail
    /// codes: a collision aborts the transaction and the whole attempt is
    /// re-run, bounded by [`MAX_CODE_ALLOCATION_ATTEMPTS`].
    async fn begin_with_handler_detail(
        &self,
        organization_id: Uuid,
        class: InstrumentClass,
        title: &str,
    ) -> Result<(DatabaseTransaction, details::Model), TreasuryError> {
        let offset = class.code_offset(&self.numbering);

        for attempt in 0..MAX_CODE_ALLOCATION_ATTEMPTS {
            let txn = self.db.begin().await?;

            let used = used_codes(&txn, organization_id).await?;
            let code = next_free_code(&used, offset)
                .map_err(|_| TreasuryError::NoCodesAvailable(attempt))?;

            match insert_detail(
                &txn,
                organization_id,
                &code,
                title,
                DetailKind::SystemManaged,
            )
            .await
            {
                Ok(detail) => return Ok((txn, detail)),
                Err(err) if is_unique_violation(&err) => {
                    drop(txn);
                    tracing::debug!(attempt, %code, "handler code collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(TreasuryError::NoCodesAvailable(MAX_CODE_ALLOCATION_ATTEMPTS))
    }
}

/// Deletes a handler Detail, or soft-disables it when journal items or
/// other records still reference it.
async fn drop_handler_detail(
    txn: &DatabaseTransaction,
    detail_id: Uuid,
) -> Result<(), TreasuryError> {
    if reference_count(txn, detail_id).await? > 0 {
        if let Some(detail) = details::Entity::find_by_id(detail_id).one(txn).await? {
            let mut active: details::ActiveModel = detail.into();
            active.is_active = Set(false);
            active.updated_at = Set(chrono::Utc::now().into());
            active.update(txn).await?;
            tracing::info!(detail = %detail_id, "handler detail soft-disabled");
        }
    } else {
        details::Entity::delete_by_id(detail_id).exec(txn).await?;
    }
    Ok(())
}
