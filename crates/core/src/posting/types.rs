//! Posting domain types.

use daftar_shared::types::{CodeNodeId, DetailId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a treasury voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherKind {
    /// Money coming in; instrument lines are debits.
    Receipt,
    /// Money going out; instrument lines are credits.
    Payment,
}

/// Receipt/payment lifecycle status.
///
/// This vocabulary is entity-local: journals use draft/posted, vouchers use
/// draft/sent. `Sent` means the voucher has been compiled into a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Voucher is being drafted; items may still change.
    Draft,
    /// Voucher has been posted to the ledger (terminal).
    Sent,
}

impl VoucherStatus {
    /// Returns true if the voucher can be modified or deleted.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the voucher has already been posted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Payment instrument referenced by a voucher line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    /// Cash through a cashbox.
    Cash,
    /// Card through a card reader.
    Card,
    /// Bank transfer into/out of a bank account.
    Transfer,
    /// A check: incoming on receipts, outgoing on payments.
    Check,
    /// Spending an in-cashbox incoming check (payments only).
    Checkin,
}

impl InstrumentType {
    /// Returns true if this instrument may appear on the given voucher kind.
    #[must_use]
    pub const fn allowed_on(self, kind: VoucherKind) -> bool {
        match self {
            Self::Cash | Self::Card | Self::Transfer | Self::Check => true,
            Self::Checkin => matches!(kind, VoucherKind::Payment),
        }
    }

    /// Returns true if an item of this type requires a header cashbox.
    #[must_use]
    pub const fn requires_cashbox(self, kind: VoucherKind) -> bool {
        match kind {
            VoucherKind::Receipt => matches!(self, Self::Cash | Self::Check),
            VoucherKind::Payment => matches!(self, Self::Cash | Self::Checkin),
        }
    }

    /// Returns the string representation of the instrument type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::Check => "check",
            Self::Checkin => "checkin",
        }
    }
}

impl std::fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chart-code slots the resolution chain fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSlot {
    /// Code for cash instrument lines.
    Cash,
    /// Code for card instrument lines.
    Card,
    /// Code for bank transfer lines.
    Transfer,
    /// Code for check and check-in lines.
    Check,
    /// Code for the counter-line against the voucher counterparty.
    Counterparty,
}

impl CodeSlot {
    /// Slot used for an instrument line of the given type.
    #[must_use]
    pub const fn for_instrument(instrument: InstrumentType) -> Self {
        match instrument {
            InstrumentType::Cash => Self::Cash,
            InstrumentType::Card => Self::Card,
            InstrumentType::Transfer => Self::Transfer,
            InstrumentType::Check | InstrumentType::Checkin => Self::Check,
        }
    }

    /// Name of the settings record consulted in resolution tier 2.
    #[must_use]
    pub const fn setting_key(self, kind: VoucherKind) -> &'static str {
        match (kind, self) {
            (VoucherKind::Receipt, Self::Cash) => "treasury.receipt.cash_code",
            (VoucherKind::Receipt, Self::Card) => "treasury.receipt.card_code",
            (VoucherKind::Receipt, Self::Transfer) => "treasury.receipt.transfer_code",
            (VoucherKind::Receipt, Self::Check) => "treasury.receipt.check_code",
            (VoucherKind::Receipt, Self::Counterparty) => "treasury.receipt.counterparty_code",
            (VoucherKind::Payment, Self::Cash) => "treasury.payment.cash_code",
            (VoucherKind::Payment, Self::Card) => "treasury.payment.card_code",
            (VoucherKind::Payment, Self::Transfer) => "treasury.payment.transfer_code",
            (VoucherKind::Payment, Self::Check) => "treasury.payment.check_code",
            (VoucherKind::Payment, Self::Counterparty) => "treasury.payment.counterparty_code",
        }
    }

    /// Literal account code consulted in resolution tier 3.
    ///
    /// These match the seeded default chart of accounts.
    #[must_use]
    pub const fn fallback_code(self, kind: VoucherKind) -> &'static str {
        match (kind, self) {
            (_, Self::Cash) => "1101",
            (_, Self::Card | Self::Transfer) => "1102",
            (VoucherKind::Receipt, Self::Check) => "1104",
            (VoucherKind::Receipt, Self::Counterparty) => "1105",
            (VoucherKind::Payment, Self::Check) => "2102",
            (VoucherKind::Payment, Self::Counterparty) => "2101",
        }
    }
}

/// A voucher item with its instrument resolved to a chart code and detail.
///
/// Repositories build these: `code_id` comes out of the resolution chain and
/// `detail_id` is the instrument's handler Detail (cashbox, bank account,
/// card reader) or, for checks, the check's beneficiary detail.
#[derive(Debug, Clone)]
pub struct InstrumentLine {
    /// Instrument type of the underlying voucher item.
    pub instrument: InstrumentType,
    /// Line amount.
    pub amount: Decimal,
    /// Resolved chart-of-accounts code.
    pub code_id: CodeNodeId,
    /// Resolved detail (handler or beneficiary).
    pub detail_id: Option<DetailId>,
    /// Optional line description.
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkin_only_on_payments() {
        assert!(!InstrumentType::Checkin.allowed_on(VoucherKind::Receipt));
        assert!(InstrumentType::Checkin.allowed_on(VoucherKind::Payment));
        assert!(InstrumentType::Check.allowed_on(VoucherKind::Receipt));
    }

    #[test]
    fn test_cashbox_requirements() {
        assert!(InstrumentType::Cash.requires_cashbox(VoucherKind::Receipt));
        assert!(InstrumentType::Check.requires_cashbox(VoucherKind::Receipt));
        assert!(!InstrumentType::Card.requires_cashbox(VoucherKind::Receipt));
        assert!(InstrumentType::Checkin.requires_cashbox(VoucherKind::Payment));
        assert!(!InstrumentType::Check.requires_cashbox(VoucherKind::Payment));
    }

    #[test]
    fn test_slot_for_instrument() {
        assert_eq!(
            CodeSlot::for_instrument(InstrumentType::Checkin),
            CodeSlot::Check
        );
        assert_eq!(CodeSlot::for_instrument(InstrumentType::Cash), CodeSlot::Cash);
    }

    #[test]
    fn test_setting_keys_distinct_per_kind() {
        assert_ne!(
            CodeSlot::Cash.setting_key(VoucherKind::Receipt),
            CodeSlot::Cash.setting_key(VoucherKind::Payment)
        );
    }

    #[test]
    fn test_voucher_status() {
        assert!(VoucherStatus::Draft.is_editable());
        assert!(VoucherStatus::Sent.is_terminal());
        assert!(!VoucherStatus::Sent.is_editable());
    }
}
