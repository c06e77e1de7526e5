//! Property-based tests for detail code validation and allocation.

use proptest::prelude::*;
use std::collections::HashSet;

use super::codes::{MAX_CODE, format_code, next_free_code};
use super::rules::validate_detail_code;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every value in the code space formats to a string that validates.
    #[test]
    fn prop_formatted_codes_validate(value in 0u16..=MAX_CODE) {
        prop_assert!(validate_detail_code(&format_code(value)).is_ok());
    }

    /// Any string that is not exactly four ASCII digits is rejected.
    #[test]
    fn prop_non_four_digit_strings_rejected(s in "[a-zA-Z0-9]{0,6}") {
        let is_four_digits = s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit());
        prop_assert_eq!(validate_detail_code(&s).is_ok(), is_four_digits);
    }

    /// The suggested code is never already used and never below the offset.
    #[test]
    fn prop_suggested_code_is_free(
        used in prop::collection::hash_set(0u16..=MAX_CODE, 0..50),
        offset in 0u16..9000,
    ) {
        let used: HashSet<u16> = used;
        if let Ok(code) = next_free_code(&used, offset) {
            let value: u16 = code.parse().unwrap();
            prop_assert!(!used.contains(&value));
            prop_assert!(value >= offset);
            // Smallest free value: everything between offset and it is used.
            for candidate in offset..value {
                prop_assert!(used.contains(&candidate));
            }
        }
    }
}
