//! Property-based tests for journal validation and reversal.

use daftar_shared::types::CodeNodeId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::reversal::reversing_items;
use super::types::JournalItemInput;
use super::validation::validate_items;

/// Strategy for a positive amount between 0.01 and 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn debit_item(amount: Decimal) -> JournalItemInput {
    JournalItemInput {
        code_id: CodeNodeId::new(),
        party_id: None,
        detail_id: None,
        debit: amount,
        credit: Decimal::ZERO,
        description: None,
    }
}

fn credit_item(amount: Decimal) -> JournalItemInput {
    JournalItemInput {
        code_id: CodeNodeId::new(),
        party_id: None,
        detail_id: None,
        debit: Decimal::ZERO,
        credit: amount,
        description: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Mirrored debit/credit sets always validate and balance exactly.
    #[test]
    fn prop_mirrored_sets_balance(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let mut items: Vec<JournalItemInput> =
            amounts.iter().map(|a| debit_item(*a)).collect();
        items.extend(amounts.iter().map(|a| credit_item(*a)));

        let totals = validate_items(&items).unwrap();
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.debits, totals.credits);
    }

    /// A single-sided set beyond epsilon never validates.
    #[test]
    fn prop_skewed_sets_rejected(amount in positive_amount()) {
        let items = vec![debit_item(amount), credit_item(amount + Decimal::ONE)];
        prop_assert!(validate_items(&items).is_err());
    }

    /// Reversal is involutive on signs: reversing twice restores every
    /// item's original debit/credit amounts.
    #[test]
    fn prop_reversal_involutive(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let mut items: Vec<JournalItemInput> =
            amounts.iter().map(|a| debit_item(*a)).collect();
        items.extend(amounts.iter().map(|a| credit_item(*a)));

        let twice = reversing_items(&reversing_items(&items));
        for (original, round_tripped) in items.iter().zip(twice.iter()) {
            prop_assert_eq!(original.debit, round_tripped.debit);
            prop_assert_eq!(original.credit, round_tripped.credit);
        }
    }

    /// A reversal of a balanced set is itself balanced.
    #[test]
    fn prop_reversal_preserves_balance(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let mut items: Vec<JournalItemInput> =
            amounts.iter().map(|a| debit_item(*a)).collect();
        items.extend(amounts.iter().map(|a| credit_item(*a)));

        prop_assert!(validate_items(&reversing_items(&items)).is_ok());
    }
}
