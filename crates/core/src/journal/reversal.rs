//! Reversal of posted journals.
//!
//! Posted journals are immutable; reversing one creates a NEW posted journal
//! dated the same as the original, with every item's debit and credit
//! swapped. Applying a reversal twice restores the original signs.

use super::types::JournalItemInput;

/// Prefix applied to reversing line descriptions.
const REVERSAL_PREFIX: &str = "Reversal";

/// Creates reversing items by swapping debits and credits.
///
/// Descriptions are prefixed with "Reversal"; all other fields carry over.
#[must_use]
pub fn reversing_items(original: &[JournalItemInput]) -> Vec<JournalItemInput> {
    original
        .iter()
        .map(|item| JournalItemInput {
            code_id: item.code_id,
            party_id: item.party_id,
            detail_id: item.detail_id,
            debit: item.credit,
            credit: item.debit,
            description: Some(prefixed(item.description.as_deref())),
        })
        .collect()
}

/// Builds the reversing journal's description from the original's.
#[must_use]
pub fn reverse_description(original: Option<&str>) -> String {
    prefixed(original)
}

/// Builds the `REV-`-prefixed reference label for a reversing journal.
#[must_use]
pub fn reversal_ref_label(original_ref_no: i64) -> String {
    format!("REV-{original_ref_no}")
}

fn prefixed(description: Option<&str>) -> String {
    match description {
        Some(text) if !text.is_empty() => format!("{REVERSAL_PREFIX}: {text}"),
        _ => REVERSAL_PREFIX.to_string(),
    }
}
