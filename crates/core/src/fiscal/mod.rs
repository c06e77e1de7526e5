//! Fiscal year lifecycle and the single-open-year invariant.

pub mod error;
pub mod year;

pub use error::FiscalError;
pub use year::{FiscalYear, assert_single_open, next_year_range, pick_fallback, validate_date_range};
