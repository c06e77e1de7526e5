//! Property-based tests for the check state machine.

use proptest::prelude::*;

use super::check::{CheckKind, CheckStatus};

fn any_kind() -> impl Strategy<Value = CheckKind> {
    prop_oneof![Just(CheckKind::Incoming), Just(CheckKind::Outgoing)]
}

fn any_status() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::Created),
        Just(CheckStatus::InCashbox),
        Just(CheckStatus::Issued),
        Just(CheckStatus::Spent),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Self-transitions are never in the table.
    #[test]
    fn prop_no_self_transitions(kind in any_kind(), status in any_status()) {
        prop_assert!(!CheckStatus::can_transition(kind, status, status));
    }

    /// Every allowed transition has an allowed inverse (saves are
    /// revertible by re-saving without the item).
    #[test]
    fn prop_transitions_are_revertible(
        kind in any_kind(),
        from in any_status(),
        to in any_status(),
    ) {
        if CheckStatus::can_transition(kind, from, to) {
            prop_assert!(CheckStatus::can_transition(kind, to, from));
        }
    }

    /// Outgoing checks never touch cashbox states; incoming never "issued".
    #[test]
    fn prop_kinds_stay_in_their_lanes(from in any_status(), to in any_status()) {
        if CheckStatus::can_transition(CheckKind::Outgoing, from, to) {
            prop_assert!(to != CheckStatus::InCashbox && to != CheckStatus::Created);
        }
        if CheckStatus::can_transition(CheckKind::Incoming, from, to) {
            prop_assert!(to != CheckStatus::Issued);
        }
    }
}
