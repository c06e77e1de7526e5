//! Free-code scanning for the four-digit detail code space.
//!
//! Detail code suggestion and instrument handler allocation share this one
//! allocator; callers differ only in the starting offset. A linear scan is
//! fine at this data scale. Allocation is read-then-insert, so the database
//! keeps a unique index on the code column and callers retry on conflict up
//! to [`MAX_CODE_ALLOCATION_ATTEMPTS`] times.

use std::collections::HashSet;

use super::error::CatalogError;

/// Upper bound on read-then-insert retries when allocating a code.
pub const MAX_CODE_ALLOCATION_ATTEMPTS: usize = 10;

/// Last value in the four-digit code space.
pub const MAX_CODE: u16 = 9999;

/// Formats a numeric code as a zero-padded four-digit string.
#[must_use]
pub fn format_code(value: u16) -> String {
    format!("{value:04}")
}

/// Returns the smallest unused code in `offset..=9999`.
///
/// `used` holds the numeric values of codes already taken (callers parse
/// stored strings; non-numeric strings cannot exist past validation).
///
/// # Errors
///
/// Returns `NoCodesAvailable` when the whole range from `offset` is taken.
pub fn next_free_code(used: &HashSet<u16>, offset: u16) -> Result<String, CatalogError> {
    (offset..=MAX_CODE)
        .find(|candidate| !used.contains(candidate))
        .map(format_code)
        .ok_or(CatalogError::NoCodesAvailable { offset })
}
