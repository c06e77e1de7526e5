//! Fiscal year types and invariant helpers.

use chrono::{Days, Months, NaiveDate};
use daftar_shared::types::{FiscalYearId, OrganizationId};
use serde::{Deserialize, Serialize};

use super::error::FiscalError;

/// A fiscal year.
///
/// Years are created closed; only the fiscal year manager opens one, and at
/// most one year per organization is open at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Unique identifier.
    pub id: FiscalYearId,
    /// Organization this year belongs to.
    pub organization_id: OrganizationId,
    /// Year name (e.g., "FY2026").
    pub name: String,
    /// First day of the year.
    pub start_date: NaiveDate,
    /// Last day of the year.
    pub end_date: NaiveDate,
    /// Whether the year is closed. Exactly one open (false) year may exist.
    pub is_closed: bool,
}

impl FiscalYear {
    /// Returns true if the given date falls within this year.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Validates that `start` is strictly before `end`.
///
/// # Errors
///
/// Returns `InvalidDateRange` otherwise.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), FiscalError> {
    if start >= end {
        return Err(FiscalError::InvalidDateRange);
    }
    Ok(())
}

/// Computes the date range of the year following one ending on `end`.
///
/// The next year starts the day after `end` and runs one year minus a day:
/// a year ending 2024-12-31 rolls forward to [2025-01-01, 2025-12-31].
///
/// Returns `None` only at the edge of the representable date range.
#[must_use]
pub fn next_year_range(end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = end.checked_add_days(Days::new(1))?;
    let next_end = start
        .checked_add_months(Months::new(12))?
        .checked_sub_days(Days::new(1))?;
    Some((start, next_end))
}

/// Checks the exclusivity invariant over an organization's years.
///
/// Invoked inside every transaction that could violate it, rather than
/// duplicating the count at each call site.
///
/// # Errors
///
/// Returns `MultipleOpenYears` when more than one year is open.
pub fn assert_single_open(years: &[FiscalYear]) -> Result<(), FiscalError> {
    let open = years.iter().filter(|y| !y.is_closed).count();
    if open > 1 {
        return Err(FiscalError::MultipleOpenYears(open));
    }
    Ok(())
}

/// Picks the year to re-open when the open year is deleted.
///
/// Prefers the chronologically previous year by start date (the closest
/// earlier one), else the closest later one.
#[must_use]
pub fn pick_fallback<'a>(
    years: &'a [FiscalYear],
    deleted: &FiscalYear,
) -> Option<&'a FiscalYear> {
    let remaining = years.iter().filter(|y| y.id != deleted.id);

    let previous = remaining
        .clone()
        .filter(|y| y.start_date < deleted.start_date)
        .max_by_key(|y| y.start_date);

    previous.or_else(|| {
        remaining
            .filter(|y| y.start_date > deleted.start_date)
            .min_by_key(|y| y.start_date)
    })
}
