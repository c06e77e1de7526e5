//! Check lifecycle state machine.
//!
//! Transitions are driven exclusively by receipt/payment save operations,
//! never by direct check edits. The transition table is the single source of
//! truth; anything not in it is rejected.
//!
//! Incoming checks: Created → InCashbox → Spent (and back, as the owning
//! receipt/payment sheds the item). Outgoing checks: Issued → Spent (and
//! back).

use serde::{Deserialize, Serialize};

use super::error::TreasuryError;

/// Direction of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Received from a counterparty.
    Incoming,
    /// Drawn from one of our checkbooks.
    Outgoing,
}

impl CheckKind {
    /// Status a freshly recorded check of this kind starts in.
    #[must_use]
    pub const fn initial_status(self) -> CheckStatus {
        match self {
            Self::Incoming => CheckStatus::Created,
            Self::Outgoing => CheckStatus::Issued,
        }
    }
}

/// Check lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Incoming check received, not yet deposited.
    Created,
    /// Incoming check recorded in a cashbox via a receipt.
    InCashbox,
    /// Outgoing check drawn from a checkbook.
    Issued,
    /// Consumed by a payment (or check-in payment item).
    Spent,
}

impl CheckStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InCashbox => "incashbox",
            Self::Issued => "issued",
            Self::Spent => "spent",
        }
    }

    /// The transition table. Any pair not listed here is invalid.
    #[must_use]
    pub const fn can_transition(kind: CheckKind, from: Self, to: Self) -> bool {
        matches!(
            (kind, from, to),
            // Receipt save deposits an incoming check.
            (CheckKind::Incoming, Self::Created, Self::InCashbox)
            // Receipt re-save sheds the check (no other reference remains).
            | (CheckKind::Incoming, Self::InCashbox, Self::Created)
            // Payment check-in item spends a deposited incoming check.
            | (CheckKind::Incoming, Self::InCashbox, Self::Spent)
            // Payment re-save sheds the check-in item.
            | (CheckKind::Incoming, Self::Spent, Self::InCashbox)
            // Payment check item spends an issued outgoing check.
            | (CheckKind::Outgoing, Self::Issued, Self::Spent)
            // Payment re-save sheds the check item.
            | (CheckKind::Outgoing, Self::Spent, Self::Issued)
        )
    }

    /// Validates and performs a transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCheckTransition` for any pair outside the table.
    pub fn transition(self, kind: CheckKind, to: Self) -> Result<Self, TreasuryError> {
        if Self::can_transition(kind, self, to) {
            Ok(to)
        } else {
            Err(TreasuryError::InvalidCheckTransition {
                kind,
                from: self,
                to,
            })
        }
    }

    /// Status the check reverts to when a payment sheds its spend item.
    #[must_use]
    pub const fn unspent_status(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Incoming => Self::InCashbox,
            CheckKind::Outgoing => Self::Issued,
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_statuses() {
        assert_eq!(CheckKind::Incoming.initial_status(), CheckStatus::Created);
        assert_eq!(CheckKind::Outgoing.initial_status(), CheckStatus::Issued);
    }

    #[test]
    fn test_incoming_deposit_and_revert() {
        let status = CheckStatus::Created
            .transition(CheckKind::Incoming, CheckStatus::InCashbox)
            .unwrap();
        assert_eq!(status, CheckStatus::InCashbox);

        let status = status
            .transition(CheckKind::Incoming, CheckStatus::Created)
            .unwrap();
        assert_eq!(status, CheckStatus::Created);
    }

    #[test]
    fn test_incoming_spend_and_revert() {
        let status = CheckStatus::InCashbox
            .transition(CheckKind::Incoming, CheckStatus::Spent)
            .unwrap();
        let status = status
            .transition(CheckKind::Incoming, CheckStatus::InCashbox)
            .unwrap();
        assert_eq!(status, CheckStatus::InCashbox);
    }

    #[test]
    fn test_outgoing_spend_and_revert() {
        let status = CheckStatus::Issued
            .transition(CheckKind::Outgoing, CheckStatus::Spent)
            .unwrap();
        assert_eq!(status, CheckStatus::Spent);
        assert_eq!(
            status
                .transition(CheckKind::Outgoing, CheckStatus::Issued)
                .unwrap(),
            CheckStatus::Issued
        );
    }

    #[test]
    fn test_created_cannot_be_spent_directly() {
        // An incoming check must pass through a cashbox before spending.
        assert!(
            CheckStatus::Created
                .transition(CheckKind::Incoming, CheckStatus::Spent)
                .is_err()
        );
    }

    #[test]
    fn test_kinds_do_not_cross() {
        // Outgoing checks never enter a cashbox.
        assert!(
            CheckStatus::Issued
                .transition(CheckKind::Outgoing, CheckStatus::InCashbox)
                .is_err()
        );
        // Incoming checks are never "issued".
        assert!(
            CheckStatus::Created
                .transition(CheckKind::Incoming, CheckStatus::Issued)
                .is_err()
        );
    }

    #[test]
    fn test_unspent_status_by_kind() {
        assert_eq!(
            CheckStatus::unspent_status(CheckKind::Incoming),
            CheckStatus::InCashbox
        );
        assert_eq!(
            CheckStatus::unspent_status(CheckKind::Outgoing),
            CheckStatus::Issued
        );
    }
}
