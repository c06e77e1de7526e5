//! Fiscal year repository.
//!
//! Enforces the exclusivity invariant: at most one open year per
//! organization at any time. Every mutating operation that could violate it
//! runs in a single transaction, takes row locks on the organization's year
//! rows, and re-checks the invariant before committing. A partial unique
//! index on `(organization_id) WHERE NOT is_closed` backstops it at the
//! database level.

use chrono::NaiveDate;
use daftar_core::fiscal::{self, FiscalYear, next_year_range};
use daftar_shared::types::{FiscalYearId, OrganizationId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{fiscal_years, journals, payments, receipts};

/// Error types for fiscal year operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalError {
    /// Start date must be before end date.
    #[error("Start date must be before end date")]
    InvalidDateRange,

    /// A fiscal year already starts on this date.
    #[error("A fiscal year already starts on {0}")]
    DuplicateRange(NaiveDate),

    /// Rolling forward requires the source year to be closed.
    #[error("Fiscal year {0} must be closed before rolling forward")]
    MustBeClosed(Uuid),

    /// Year is referenced by journals, receipts, or payments.
    #[error("Fiscal year {0} has documents")]
    HasDocuments(Uuid),

    /// Date edits are rejected once the year has documents.
    #[error("Fiscal year {0} has documents; dates cannot change")]
    DatesLocked(Uuid),

    /// The exclusivity invariant would be violated.
    #[error("{0} fiscal years are open, expected at most one")]
    MultipleOpenYears(usize),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Year name (e.g., "FY2026").
    pub name: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year.
    pub end_date: NaiveDate,
}

/// Input for updating a fiscal year.
#[derive(Debug, Clone, Default)]
pub struct UpdateFiscalYearInput {
    /// New name.
    pub name: Option<String>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
}

/// Fiscal year repository.
#[derive(Debug, Clone)]
pub struct FiscalYearRepository {
    db: DatabaseConnection,
}

impl FiscalYearRepository {
    /// Creates a new fiscal year repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fiscal year. New years start closed; only [`Self::open`]
    /// or [`Self::open_next`] opens one.
    pub async fn create(
        &self,
        input: CreateFiscalYearInput,
    ) -> Result<fiscal_years::Model, FiscalError> {
        fiscal::validate_date_range(input.start_date, input.end_date)
            .map_err(|_| FiscalError::InvalidDateRange)?;
        self.ensure_start_free(input.organization_id, input.start_date)
            .await?;

        Ok(insert_year(
            &self.db,
            input.organization_id,
            &input.name,
            input.start_date,
            input.end_date,
            true,
        )
        .await?)
    }

    /// Opens a year, closing every other year of the organization in the
    /// same transaction (all-or-nothing).
    pub async fn open(&self, id: Uuid) -> Result<fiscal_years::Model, FiscalError> {
        let txn = self.db.begin().await?;

        let target = find_locked(&txn, id).await?;
        close_open_years(&txn, target.organization_id, Some(id)).await?;

        let mut active: fiscal_years::ActiveModel = target.into();
        active.is_closed = Set(false);
        active.updated_at = Set(chrono::Utc::now().into());
        let opened = active.update(&txn).await?;

        assert_single_open(&txn, opened.organization_id).await?;
        txn.commit().await?;

        tracing::info!(year = %opened.id, "fiscal year opened");
        Ok(opened)
    }

    /// Rolls a closed year forward: creates the following year (day after
    /// `end_date`, one year minus a day long) and opens it, closing any
    /// other open year in the same transaction.
    pub async fn open_next(&self, id: Uuid) -> Result<fiscal_years::Model, FiscalError> {
        let txn = self.db.begin().await?;

        let source = find_locked(&txn, id).await?;
        if !source.is_closed {
            return Err(FiscalError::MustBeClosed(id));
        }

        let (start, end) = next_year_range(source.end_date)
            .ok_or(FiscalError::InvalidDateRange)?;

        let duplicate = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::OrganizationId.eq(source.organization_id))
            .filter(fiscal_years::Column::StartDate.eq(start))
            .count(&txn)
            .await?;
        if duplicate > 0 {
            return Err(FiscalError::DuplicateRange(start));
        }

        close_open_years(&txn, source.organization_id, None).await?;

        let name = format!("FY{}", chrono::Datelike::year(&start));
        let created = insert_year(&txn, source.organization_id, &name, start, end, false).await?;

        assert_single_open(&txn, created.organization_id).await?;
        txn.commit().await?;

        tracing::info!(year = %created.id, %start, %end, "fiscal year rolled forward");
        Ok(created)
    }

    /// Updates a fiscal year. Date changes are rejected once the year has
    /// documents.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateFiscalYearInput,
    ) -> Result<fiscal_years::Model, FiscalError> {
        let year = self.get(id).await?;

        let dates_change = input.start_date.is_some_and(|d| d != year.start_date)
            || input.end_date.is_some_and(|d| d != year.end_date);
        if dates_change {
            if has_documents(&self.db, id).await? {
                return Err(FiscalError::DatesLocked(id));
            }

            let start = input.start_date.unwrap_or(year.start_date);
            let end = input.end_date.unwrap_or(year.end_date);
            fiscal::validate_date_range(start, end)
                .map_err(|_| FiscalError::InvalidDateRange)?;
            if start != year.start_date {
                self.ensure_start_free(year.organization_id, start).await?;
            }
        }

        let mut active: fiscal_years::ActiveModel = year.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a fiscal year with no documents.
    ///
    /// When the deleted year is the open one, a fallback year is re-opened
    /// in the same transaction (the chronologically previous year by start
    /// date, else the next), so the exclusivity invariant is never
    /// observably violated.
    pub async fn delete(&self, id: Uuid) -> Result<(), FiscalError> {
        let txn = self.db.begin().await?;

        let year = find_locked(&txn, id).await?;
        if has_documents(&txn, id).await? {
            return Err(FiscalError::HasDocuments(id));
        }

        let was_open = !year.is_closed;
        let organization_id = year.organization_id;

        fiscal_years::Entity::delete_by_id(id).exec(&txn).await?;

        if was_open {
            let remaining = load_years(&txn, organization_id, true).await?;
            let deleted = to_domain(&year);
            if let Some(fallback) = fiscal::pick_fallback(&remaining, &deleted) {
                let fallback_id = fallback.id.into_inner();
                let model = find_locked(&txn, fallback_id).await?;
                let mut active: fiscal_years::ActiveModel = model.into();
                active.is_closed = Set(false);
                active.updated_at = Set(chrono::Utc::now().into());
                active.update(&txn).await?;
                tracing::info!(year = %fallback_id, "fallback fiscal year re-opened");
            }
        }

        assert_single_open(&txn, organization_id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Fetches a year by id.
    pub async fn get(&self, id: Uuid) -> Result<fiscal_years::Model, FiscalError> {
        fiscal_years::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(FiscalError::NotFound(id))
    }

    /// Returns the organization's open year, if any.
    pub async fn open_year(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<fiscal_years::Model>, FiscalError> {
        Ok(fiscal_years::Entity::find()
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id))
            .filter(fiscal_years::Column::IsClosed.eq(false))
            .one(&self.db)
            .await?)
    }

    /// Lists the organization's years by start date.
    pub async fn list(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<fiscal_years::Model>, FiscalError> {
        Ok(fiscal_years::Entity::find()
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id))
            .order_by_asc(fiscal_years::Column::StartDate)
            .all(&self.db)
            .await?)
    }

    /// Returns true if any journal, receipt, or payment references the year.
    pub async fn has_documents(&self, id: Uuid) -> Result<bool, FiscalError> {
        has_documents(&self.db, id).await
    }

    async fn ensure_start_free(
        &self,
        organization_id: Uuid,
        start: NaiveDate,
    ) -> Result<(), FiscalError> {
        let duplicate = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id))
            .filter(fiscal_years::Column::StartDate.eq(start))
            .count(&self.db)
            .await?;
        if duplicate > 0 {
            return Err(FiscalError::DuplicateRange(start));
        }
        Ok(())
    }
}

async fn find_locked(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<fiscal_years::Model, FiscalError> {
    fiscal_years::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(FiscalError::NotFound(id))
}

/// Closes every open year of the organization, except `keep` when given.
async fn close_open_years(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    keep: Option<Uuid>,
) -> Result<(), FiscalError> {
    let mut query = fiscal_years::Entity::find()
        .filter(fiscal_years::Column::OrganizationId.eq(organization_id))
        .filter(fiscal_years::Column::IsClosed.eq(false))
        .lock_exclusive();
    if let Some(keep) = keep {
        query = query.filter(fiscal_years::Column::Id.ne(keep));
    }

    for open in query.all(txn).await? {
        let mut active: fiscal_years::ActiveModel = open.into();
        active.is_closed = Set(true);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(txn).await?;
    }
    Ok(())
}

/// Re-checks the exclusivity invariant inside the transaction.
async fn assert_single_open<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
) -> Result<(), FiscalError> {
    let years = load_years(conn, organization_id, false).await?;
    fiscal::assert_single_open(&years).map_err(|err| match err {
        fiscal::FiscalError::MultipleOpenYears(n) => FiscalError::MultipleOpenYears(n),
        other => FiscalError::Database(DbErr::Custom(other.to_string())),
    })
}

async fn load_years<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    closed_only: bool,
) -> Result<Vec<FiscalYear>, FiscalError> {
    let mut query = fiscal_years::Entity::find()
        .filter(fiscal_years::Column::OrganizationId.eq(organization_id));
    if closed_only {
        query = query.filter(fiscal_years::Column::IsClosed.eq(true));
    }

    Ok(query.all(conn).await?.iter().map(to_domain).collect())
}

fn to_domain(model: &fiscal_years::Model) -> FiscalYear {
    FiscalYear {
        id: FiscalYearId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        name: model.name.clone(),
        start_date: model.start_date,
        end_date: model.end_date,
        is_closed: model.is_closed,
    }
}

async fn insert_year<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_closed: bool,
) -> Result<fiscal_years::Model, DbErr> {
    let now = chrono::Utc::now().into();
    fiscal_years::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        name: Set(name.to_string()),
        start_date: Set(start_date),
        end_date: Set(end_date),
        is_closed: Set(is_closed),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Returns true if any journal, receipt, or payment references the year.
async fn has_documents<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, FiscalError> {
    let journal_count = journals::Entity::find()
        .filter(journals::Column::FiscalYearId.eq(id))
        .count(conn)
        .await?;
    if journal_count > 0 {
        return Ok(true);
    }

    let receipt_count = receipts::Entity::find()
        .filter(receipts::Column::FiscalYearId.eq(id))
        .count(conn)
        .await?;
    if receipt_count > 0 {
        return Ok(true);
    }

    let payment_count = payments::Entity::find()
        .filter(payments::Column::FiscalYearId.eq(id))
        .count(conn)
        .await?;
    Ok(payment_count > 0)
}
