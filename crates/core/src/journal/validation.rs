//! Business rule validation for journal items.

use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::{JournalItemInput, JournalTotals};

/// Validates a set of journal items and computes their totals.
///
/// Per-item rule: amounts are non-negative and exactly one side is positive.
/// Per-journal rule: the debit and credit sums agree within the epsilon
/// tolerance (stored amounts may be accumulated from line sums upstream).
///
/// # Errors
///
/// Returns an error if any item violates the XOR rule or the set does not
/// balance.
pub fn validate_items(items: &[JournalItemInput]) -> Result<JournalTotals, JournalError> {
    if items.is_empty() {
        return Err(JournalError::NoItems);
    }

    for (index, item) in items.iter().enumerate() {
        if item.debit < Decimal::ZERO || item.credit < Decimal::ZERO {
            return Err(JournalError::NegativeAmount { index });
        }
        let has_debit = item.debit > Decimal::ZERO;
        let has_credit = item.credit > Decimal::ZERO;
        match (has_debit, has_credit) {
            (true, true) => return Err(JournalError::BothSidesSet { index }),
            (false, false) => return Err(JournalError::NoSideSet { index }),
            _ => {}
        }
    }

    let totals = JournalTotals::from_items(items);
    if !totals.is_balanced {
        return Err(JournalError::Unbalanced {
            debits: totals.debits,
            credits: totals.credits,
        });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daftar_shared::types::CodeNodeId;
    use rust_decimal_macros::dec;

    fn item(debit: Decimal, credit: Decimal) -> JournalItemInput {
        JournalItemInput {
            code_id: CodeNodeId::new(),
            party_id: None,
            detail_id: None,
            debit,
            credit,
            description: None,
        }
    }

    #[test]
    fn test_balanced_items() {
        let totals = validate_items(&[item(dec!(100), dec!(0)), item(dec!(0), dec!(100))]).unwrap();
        assert!(totals.is_balanced);
        assert_eq!(totals.debits, dec!(100));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(validate_items(&[]), Err(JournalError::NoItems)));
    }

    #[test]
    fn test_both_sides_rejected() {
        let result = validate_items(&[item(dec!(10), dec!(10))]);
        assert!(matches!(result, Err(JournalError::BothSidesSet { index: 0 })));
    }

    #[test]
    fn test_no_side_rejected() {
        let result = validate_items(&[item(dec!(100), dec!(0)), item(dec!(0), dec!(0))]);
        assert!(matches!(result, Err(JournalError::NoSideSet { index: 1 })));
    }

    #[test]
    fn test_negative_rejected() {
        let result = validate_items(&[item(dec!(-5), dec!(0))]);
        assert!(matches!(
            result,
            Err(JournalError::NegativeAmount { index: 0 })
        ));
    }

    #[test]
    fn test_unbalanced_rejected() {
        let result = validate_items(&[item(dec!(150), dec!(0)), item(dec!(0), dec!(140))]);
        assert!(matches!(result, Err(JournalError::Unbalanced { .. })));
    }

    #[test]
    fn test_epsilon_tolerance() {
        // Within 1e-4: accepted.
        assert!(validate_items(&[item(dec!(100.00005), dec!(0)), item(dec!(0), dec!(100))]).is_ok());
        // Beyond 1e-4: rejected.
        assert!(validate_items(&[item(dec!(100.0002), dec!(0)), item(dec!(0), dec!(100))]).is_err());
    }
}
