//! Journal domain types.

use daftar_shared::types::{CodeNodeId, DetailId, amounts_equal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Journal lifecycle status.
///
/// The valid transitions are:
/// - Draft → Posted (post)
///
/// There is no reversed status: reversing a posted journal creates a new
/// posted journal with swapped sides, linked back through `reversal_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Journal is being drafted and can be modified or deleted.
    Draft,
    /// Journal has been posted to the ledger (immutable).
    Posted,
}

impl JournalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "posted" => Some(Self::Posted),
            _ => None,
        }
    }

    /// Returns true if the journal can be modified or deleted.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the journal is immutable.
    #[must_use]
    pub const fn is_immutable(self) -> bool {
        matches!(self, Self::Posted)
    }
}

impl std::fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for a single journal line item.
///
/// Exactly one of `debit`/`credit` must be positive; the other stays zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalItemInput {
    /// The chart-of-accounts node this line posts against.
    pub code_id: CodeNodeId,
    /// Optional counterparty reference (parties are an external module).
    pub party_id: Option<Uuid>,
    /// Optional detail catalogue reference.
    pub detail_id: Option<DetailId>,
    /// Debit amount (zero if this is a credit line).
    pub debit: Decimal,
    /// Credit amount (zero if this is a debit line).
    pub credit: Decimal,
    /// Optional line description.
    pub description: Option<String>,
}

impl JournalItemInput {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Journal totals for balance validation and display.
#[derive(Debug, Clone)]
pub struct JournalTotals {
    /// Total debit amount.
    pub debits: Decimal,
    /// Total credit amount.
    pub credits: Decimal,
    /// Whether the journal balances within the epsilon tolerance.
    pub is_balanced: bool,
}

impl JournalTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(debits: Decimal, credits: Decimal) -> Self {
        Self {
            debits,
            credits,
            is_balanced: amounts_equal(debits, credits),
        }
    }

    /// Sums a set of items into totals.
    #[must_use]
    pub fn from_items(items: &[JournalItemInput]) -> Self {
        let debits: Decimal = items.iter().map(|i| i.debit).sum();
        let credits: Decimal = items.iter().map(|i| i.credit).sum();
        Self::new(debits, credits)
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debits - self.credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_status_editable() {
        assert!(JournalStatus::Draft.is_editable());
        assert!(!JournalStatus::Posted.is_editable());
    }

    #[test]
    fn test_status_parse_round_trip() {
        assert_eq!(
            JournalStatus::parse(JournalStatus::Posted.as_str()),
            Some(JournalStatus::Posted)
        );
        assert_eq!(JournalStatus::parse("reversed"), None);
    }

    #[test]
    fn test_totals_balanced_within_epsilon() {
        let totals = JournalTotals::new(dec!(100.00005), dec!(100));
        assert!(totals.is_balanced);
    }

    #[test]
    fn test_totals_unbalanced() {
        let totals = JournalTotals::from_items(&[item(dec!(150), dec!(0)), item(dec!(0), dec!(140))]);
        assert!(!totals.is_balanced);
        assert_eq!(totals.difference(), dec!(10));
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(item(dec!(25), dec!(0)).signed_amount(), dec!(25));
        assert_eq!(item(dec!(0), dec!(25)).signed_amount(), dec!(-25));
    }
}
