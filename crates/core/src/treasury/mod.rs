//! Treasury instruments and the check state machine.
//!
//! This module implements the lifecycle rules for payment instruments:
//! - Check states and the explicit transition table that drives them
//! - Checkbook issuance (number range, exhaustion)
//! - Instrument classes and their handler-detail numbering offsets

pub mod check;
pub mod checkbook;
pub mod error;
pub mod types;

#[cfg(test)]
mod check_props;

pub use check::{CheckKind, CheckStatus};
pub use checkbook::{CheckbookStatus, issue_range, validate_issue_number};
pub use error::TreasuryError;
pub use types::InstrumentClass;
