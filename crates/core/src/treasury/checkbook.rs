//! Checkbook issuance rules.

use serde::{Deserialize, Serialize};

use super::error::TreasuryError;

/// Checkbook status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckbookStatus {
    /// Pages remain to be issued.
    Active,
    /// The last page has been issued.
    Exhausted,
}

/// Returns the inclusive check-number range of a checkbook.
#[must_use]
pub const fn issue_range(start_number: i64, page_count: i64) -> (i64, i64) {
    (start_number, start_number + page_count - 1)
}

/// Validates a check number against a checkbook's page range.
///
/// Returns true when the issued number is the checkbook's last page, which
/// flips the checkbook to [`CheckbookStatus::Exhausted`].
///
/// # Errors
///
/// Returns `OutOfRange` when the number falls outside the range.
pub fn validate_issue_number(
    start_number: i64,
    page_count: i64,
    number: i64,
) -> Result<bool, TreasuryError> {
    let (first, last) = issue_range(start_number, page_count);
    if number < first || number > last {
        return Err(TreasuryError::OutOfRange {
            number,
            first,
            last,
        });
    }
    Ok(number == last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_issue_range() {
        assert_eq!(issue_range(1000, 25), (1000, 1024));
    }

    #[rstest]
    #[case(1000, false)]
    #[case(1012, false)]
    #[case(1024, true)] // last page
    fn test_valid_numbers(#[case] number: i64, #[case] exhausts: bool) {
        assert_eq!(validate_issue_number(1000, 25, number).unwrap(), exhausts);
    }

    #[rstest]
    #[case(999)]
    #[case(1025)]
    #[case(0)]
    fn test_out_of_range(#[case] number: i64) {
        assert!(matches!(
            validate_issue_number(1000, 25, number),
            Err(TreasuryError::OutOfRange { first: 1000, last: 1024, .. })
        ));
    }

    #[test]
    fn test_single_page_book_exhausts_immediately() {
        assert!(validate_issue_number(500, 1, 500).unwrap());
    }
}
