//! Journal repository for double-entry ledger operations.
//!
//! Invoices and other modules post their own derived entries through
//! [`JournalRepository::create`] and [`JournalRepository::post`]; the
//! posting engine writes its compiled journals through the same internal
//! path so sequencing and validation stay in one place.

use daftar_core::journal::{
    self, JournalItemInput, JournalStatus as CoreStatus, reversal_ref_label, reverse_description,
    reversing_items, validate_items,
};
use daftar_shared::types::{CodeNodeId, DetailId};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    journal_items, journals,
    sea_orm_active_enums::JournalStatus,
};
use crate::repositories::{MAX_SEQUENCE_ATTEMPTS, is_unique_violation};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// An item or balance rule was violated.
    #[error(transparent)]
    Rule(#[from] daftar_core::journal::JournalError),

    /// Journal not found.
    #[error("Journal not found: {0}")]
    NotFound(Uuid),

    /// Sequential number allocation kept conflicting.
    #[error("Could not allocate a journal number after {0} attempts")]
    SequenceExhausted(usize),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a journal.
#[derive(Debug, Clone)]
pub struct CreateJournalInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Fiscal year the journal belongs to.
    pub fiscal_year_id: Uuid,
    /// Document date.
    pub journal_date: NaiveDate,
    /// Header description.
    pub description: Option<String>,
    /// Line items; must satisfy the XOR and balance rules.
    pub items: Vec<JournalItemInput>,
    /// Caller identity for the audit trail.
    pub created_by: Uuid,
}

/// A journal with its line items.
#[derive(Debug, Clone)]
pub struct JournalWithItems {
    /// Journal header.
    pub journal: journals::Model,
    /// Line items.
    pub items: Vec<journal_items::Model>,
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft journal with validated, balanced items.
    ///
    /// The reference number and code are allocated as `max(existing)+1`
    /// scoped to the fiscal year. Allocation is read-then-insert, so the
    /// whole transaction retries on the unique-index conflict, bounded.
    pub async fn create(
        &self,
        input: CreateJournalInput,
    ) -> Result<JournalWithItems, JournalError> {
        validate_items(&input.items)?;

        for attempt in 0..MAX_SEQUENCE_ATTEMPTS {
            let txn = self.db.begin().await?;
            let result = insert_journal(
                &txn,
                &input,
                JournalStatus::Draft,
                None,
            )
            .await;

            match result {
                Ok(created) => {
                    txn.commit().await?;
                    return Ok(created);
                }
                Err(err) if is_unique_violation(&err) => {
                    drop(txn);
                    tracing::debug!(attempt, "journal number conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(JournalError::SequenceExhausted(MAX_SEQUENCE_ATTEMPTS))
    }

    /// Replaces a draft journal's date, description, and items.
    pub async fn update(
        &self,
        id: Uuid,
        journal_date: Option<NaiveDate>,
        description: Option<Option<String>>,
        items: Option<Vec<JournalItemInput>>,
    ) -> Result<JournalWithItems, JournalError> {
        let txn = self.db.begin().await?;

        let model = find_locked(&txn, id).await?;
        ensure_draft(&model)?;

        if let Some(items) = &items {
            validate_items(items)?;
        }

        if let Some(items) = items {
            journal_items::Entity::delete_many()
                .filter(journal_items::Column::JournalId.eq(id))
                .exec(&txn)
                .await?;
            insert_items(&txn, id, &items).await?;
        }

        let mut active: journals::ActiveModel = model.into();
        if let Some(journal_date) = journal_date {
            active.journal_date = Set(journal_date);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(&txn).await?;

        let items = load_items(&txn, id).await?;
        txn.commit().await?;

        Ok(JournalWithItems {
            journal: updated,
            items,
        })
    }

    /// Deletes a draft journal and its items.
    pub async fn delete(&self, id: Uuid) -> Result<(), JournalError> {
        let txn = self.db.begin().await?;

        let model = find_locked(&txn, id).await?;
        ensure_draft(&model)?;

        journal_items::Entity::delete_many()
            .filter(journal_items::Column::JournalId.eq(id))
            .exec(&txn)
            .await?;
        journals::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Posts a draft journal, making it immutable.
    ///
    /// Totals are re-derived from the persisted items, not from client
    /// input; an unbalanced journal is rejected without any write.
    pub async fn post(&self, id: Uuid) -> Result<journals::Model, JournalError> {
        let txn = self.db.begin().await?;

        let model = find_locked(&txn, id).await?;
        ensure_draft(&model)?;

        let items = load_items(&txn, id).await?;
        validate_items(&to_domain_items(&items))?;

        let mut active: journals::ActiveModel = model.into();
        active.status = Set(JournalStatus::Posted);
        active.updated_at = Set(chrono::Utc::now().into());
        let posted = active.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(journal = %posted.id, ref_no = posted.ref_no, "journal posted");
        Ok(posted)
    }

    /// Reverses a posted journal by creating a NEW posted journal dated the
    /// same, with every item's debit/credit swapped and descriptions
    /// prefixed accordingly. The original is never mutated.
    pub async fn reverse(
        &self,
        id: Uuid,
        reversed_by: Uuid,
    ) -> Result<JournalWithItems, JournalError> {
        for attempt in 0..MAX_SEQUENCE_ATTEMPTS {
            let txn = self.db.begin().await?;

            let original = find_locked(&txn, id).await?;
            if original.status != JournalStatus::Posted {
                return Err(journal::JournalError::NotPosted(to_core_status(&original)).into());
            }

            let original_items = load_items(&txn, id).await?;
            let reversed = reversing_items(&to_domain_items(&original_items));

            let ref_label = reversal_ref_label(original.ref_no);
            let description = format!(
                "{} ({ref_label})",
                reverse_description(original.description.as_deref())
            );

            let input = CreateJournalInput {
                organization_id: original.organization_id,
                fiscal_year_id: original.fiscal_year_id,
                journal_date: original.journal_date,
                description: Some(description),
                items: reversed,
                created_by: reversed_by,
            };

            let result = insert_journal(&txn, &input, JournalStatus::Posted, Some(id)).await;
            match result {
                Ok(created) => {
                    txn.commit().await?;
                    tracing::info!(
                        original = %id,
                        reversal = %created.journal.id,
                        "journal reversed"
                    );
                    return Ok(created);
                }
                Err(err) if is_unique_violation(&err) => {
                    drop(txn);
                    tracing::debug!(attempt, "journal number conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(JournalError::SequenceExhausted(MAX_SEQUENCE_ATTEMPTS))
    }

    /// Fetches a journal with its items.
    pub async fn get_with_items(&self, id: Uuid) -> Result<JournalWithItems, JournalError> {
        let journal = journals::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(JournalError::NotFound(id))?;
        let items = load_items(&self.db, id).await?;

        Ok(JournalWithItems { journal, items })
    }

    /// Lists journals for a fiscal year, newest reference first.
    pub async fn list_for_year(
        &self,
        fiscal_year_id: Uuid,
        status: Option<CoreStatus>,
    ) -> Result<Vec<journals::Model>, JournalError> {
        let mut query = journals::Entity::find()
            .filter(journals::Column::FiscalYearId.eq(fiscal_year_id));
        if let Some(status) = status {
            query = query.filter(journals::Column::Status.eq(JournalStatus::from(status)));
        }

        Ok(query
            .order_by_desc(journals::Column::RefNo)
            .all(&self.db)
            .await?)
    }
}

/// Inserts a journal header and items inside an existing transaction,
/// allocating the next reference number and code for the fiscal year.
///
/// Callers own the retry loop: a unique-index conflict on the sequence
/// aborts the transaction and the whole operation is re-run.
pub(crate) async fn insert_journal(
    txn: &DatabaseTransaction,
    input: &CreateJournalInput,
    status: JournalStatus,
    reversal_of: Option<Uuid>,
) -> Result<JournalWithItems, DbErr> {
    // ref_no and code are allocated in lockstep, so the row with the
    // highest reference also carries the highest code.
    let last = journals::Entity::find()
        .filter(journals::Column::FiscalYearId.eq(input.fiscal_year_id))
        .order_by_desc(journals::Column::RefNo)
        .one(txn)
        .await?;
    let (ref_no, code) = last.map_or((1, 1), |j| (j.ref_no + 1, j.code + 1));

    let now = chrono::Utc::now().into();
    let journal = journals::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(input.organization_id),
        fiscal_year_id: Set(input.fiscal_year_id),
        ref_no: Set(ref_no),
        code: Set(code),
        journal_date: Set(input.journal_date),
        description: Set(input.description.clone()),
        status: Set(status),
        reversal_of: Set(reversal_of),
        created_by: Set(input.created_by),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await?;

    let items = insert_items(txn, journal.id, &input.items).await?;

    Ok(JournalWithItems { journal, items })
}

async fn insert_items(
    txn: &DatabaseTransaction,
    journal_id: Uuid,
    items: &[JournalItemInput],
) -> Result<Vec<journal_items::Model>, DbErr> {
    let now = chrono::Utc::now().into();
    let mut inserted = Vec::with_capacity(items.len());

    for item in items {
        let model = journal_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            journal_id: Set(journal_id),
            code_node_id: Set(item.code_id.into_inner()),
            party_id: Set(item.party_id),
            detail_id: Set(item.detail_id.map(DetailId::into_inner)),
            debit: Set(item.debit),
            credit: Set(item.credit),
            description: Set(item.description.clone()),
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
) -> Result<journals::Model, JournalError> {
    journals::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(JournalError::NotFound(id))
}

fn ensure_draft(model: &journals::Model) -> Result<(), JournalError> {
    if model.status == JournalStatus::Draft {
        Ok(())
    } else {
        Err(journal::JournalError::NotDraft(to_core_status(model)).into())
    }
}

fn to_core_status(model: &journals::Model) -> CoreStatus {
    model.status.clone().into()
}

/// Maps persisted item rows back into domain inputs for re-validation.
fn to_domain_items(items: &[journal_items::Model]) -> Vec<JournalItemInput> {
    items
        .iter()
        .map(|item| JournalItemInput {
            code_id: CodeNodeId::from_uuid(item.code_node_id),
            party_id: item.party_id,
            detail_id: item.detail_id.map(DetailId::from_uuid),
            debit: item.debit,
            credit: item.credit,
            description: item.description.clone(),
        })
        .collect()
}

async fn load_items<C: sea_orm::ConnectionTrait>(
    conn: &C,
    journal_id: Uuid,
) -> Result<Vec<journal_items::Model>, DbErr> {
    journal_items::Entity::find()
        .filter(journal_items::Column::JournalId.eq(journal_id))
        .order_by_asc(journal_items::Column::CreatedAt)
        .all(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_domain_items_round_trip() {
        let now = chrono::Utc::now().into();
        let row = journal_items::Model {
            id: Uuid::new_v4(),
            journal_id: Uuid::new_v4(),
            code_node_id: Uuid::new_v4(),
            party_id: None,
            detail_id: Some(Uuid::new_v4()),
            debit: dec!(120),
            credit: Decimal::ZERO,
            description: Some("cash".to_string()),
            created_at: now,
        };

        let domain = to_domain_items(std::slice::from_ref(&row));
        assert_eq!(domain[0].code_id.into_inner(), row.code_node_id);
        assert_eq!(domain[0].debit, dec!(120));
        assert_eq!(
            domain[0].detail_id.map(DetailId::into_inner),
            row.detail_id
        );
    }
}
