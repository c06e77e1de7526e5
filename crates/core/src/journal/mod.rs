//! Double-entry journal logic.
//!
//! This module implements the core ledger functionality:
//! - Journal line items and their debit/credit XOR rule
//! - Balance validation within a fixed epsilon
//! - The draft/posted lifecycle
//! - Reversal by construction of a new journal, never by mutation

pub mod error;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use error::JournalError;
pub use reversal::{reversal_ref_label, reverse_description, reversing_items};
pub use types::{JournalItemInput, JournalStatus, JournalTotals};
pub use validation::validate_items;
