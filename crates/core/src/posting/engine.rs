//! Voucher validation and journal line assembly.

use daftar_shared::types::{CodeNodeId, DetailId, amounts_equal};
use rust_decimal::Decimal;

use crate::journal::JournalItemInput;

use super::error::PostingError;
use super::types::{InstrumentLine, InstrumentType, VoucherKind, VoucherStatus};

/// Validates a voucher before compilation.
///
/// Checks, in order: terminal status, presence of items, instrument/kind
/// compatibility, the cashbox requirement for cash-handled instruments, and
/// agreement between the stored header total and the item sum (within the
/// epsilon tolerance). Nothing is written when any check fails.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_voucher(
    kind: VoucherKind,
    status: VoucherStatus,
    stated_total: Decimal,
    items: &[(InstrumentType, Decimal)],
    has_cashbox: bool,
) -> Result<(), PostingError> {
    if status.is_terminal() {
        return Err(PostingError::AlreadyPosted(status));
    }
    if items.is_empty() {
        return Err(PostingError::MissingItems);
    }

    for (index, (instrument, _)) in items.iter().enumerate() {
        if !instrument.allowed_on(kind) {
            return Err(PostingError::InstrumentNotAllowed {
                index,
                instrument: *instrument,
            });
        }
        if instrument.requires_cashbox(kind) && !has_cashbox {
            return Err(PostingError::CashboxRequired {
                index,
                instrument: *instrument,
            });
        }
    }

    let computed: Decimal = items.iter().map(|(_, amount)| *amount).sum();
    if !amounts_equal(stated_total, computed) {
        return Err(PostingError::TotalMismatch {
            stated: stated_total,
            computed,
        });
    }

    Ok(())
}

/// Builds the journal items for a validated voucher.
///
/// One line per instrument item (debit on receipts, credit on payments),
/// then one counter-line on the opposite side sized to the header total,
/// carrying the voucher's counterparty detail and the resolved counterparty
/// code. The result always balances when the inputs passed
/// [`validate_voucher`].
#[must_use]
pub fn build_journal_items(
    kind: VoucherKind,
    lines: &[InstrumentLine],
    counterparty_code_id: CodeNodeId,
    counterparty_detail_id: DetailId,
    total: Decimal,
    counter_description: Option<String>,
) -> Vec<JournalItemInput> {
    let mut items = Vec::with_capacity(lines.len() + 1);

    for line in lines {
        let (debit, credit) = match kind {
            VoucherKind::Receipt => (line.amount, Decimal::ZERO),
            VoucherKind::Payment => (Decimal::ZERO, line.amount),
        };
        items.push(JournalItemInput {
            code_id: line.code_id,
            party_id: None,
            detail_id: line.detail_id,
            debit,
            credit,
            description: line.description.clone(),
        });
    }

    let (debit, credit) = match kind {
        VoucherKind::Receipt => (Decimal::ZERO, total),
        VoucherKind::Payment => (total, Decimal::ZERO),
    };
    items.push(JournalItemInput {
        code_id: counterparty_code_id,
        party_id: None,
        detail_id: Some(counterparty_detail_id),
        debit,
        credit,
        description: counter_description,
    });

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::validate_items;
    use rust_decimal_macros::dec;

    fn line(instrument: InstrumentType, amount: Decimal) -> InstrumentLine {
        InstrumentLine {
            instrument,
            amount,
            code_id: CodeNodeId::new(),
            detail_id: Some(DetailId::new()),
            description: None,
        }
    }

    #[test]
    fn test_already_posted_rejected() {
        let result = validate_voucher(
            VoucherKind::Receipt,
            VoucherStatus::Sent,
            dec!(100),
            &[(InstrumentType::Card, dec!(100))],
            false,
        );
        assert!(matches!(result, Err(PostingError::AlreadyPosted(_))));
    }

    #[test]
    fn test_missing_items_rejected() {
        let result = validate_voucher(
            VoucherKind::Receipt,
            VoucherStatus::Draft,
            dec!(0),
            &[],
            true,
        );
        assert!(matches!(result, Err(PostingError::MissingItems)));
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let result = validate_voucher(
            VoucherKind::Receipt,
            VoucherStatus::Draft,
            dec!(150),
            &[
                (InstrumentType::Cash, dec!(100)),
                (InstrumentType::Check, dec!(40)),
            ],
            true,
        );
        assert!(matches!(
            result,
            Err(PostingError::TotalMismatch { stated, computed })
                if stated == dec!(150) && computed == dec!(140)
        ));
    }

    #[test]
    fn test_cash_without_cashbox_rejected() {
        let result = validate_voucher(
            VoucherKind::Receipt,
            VoucherStatus::Draft,
            dec!(100),
            &[(InstrumentType::Cash, dec!(100))],
            false,
        );
        assert!(matches!(
            result,
            Err(PostingError::CashboxRequired { index: 0, .. })
        ));
    }

    #[test]
    fn test_checkin_on_receipt_rejected() {
        let result = validate_voucher(
            VoucherKind::Receipt,
            VoucherStatus::Draft,
            dec!(100),
            &[(InstrumentType::Checkin, dec!(100))],
            true,
        );
        assert!(matches!(
            result,
            Err(PostingError::InstrumentNotAllowed { index: 0, .. })
        ));
    }

    #[test]
    fn test_receipt_lines_debit_instruments_credit_counterparty() {
        let lines = vec![
            line(InstrumentType::Cash, dec!(100)),
            line(InstrumentType::Check, dec!(50)),
        ];
        let counterparty_code = CodeNodeId::new();
        let counterparty_detail = DetailId::new();

        let items = build_journal_items(
            VoucherKind::Receipt,
            &lines,
            counterparty_code,
            counterparty_detail,
            dec!(150),
            Some("Receipt 12".to_string()),
        );

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].debit, dec!(100));
        assert_eq!(items[0].credit, dec!(0));
        assert_eq!(items[1].debit, dec!(50));
        assert_eq!(items[2].credit, dec!(150));
        assert_eq!(items[2].code_id, counterparty_code);
        assert_eq!(items[2].detail_id, Some(counterparty_detail));

        // The assembled set satisfies the journal balance invariant.
        assert!(validate_items(&items).is_ok());
    }

    #[test]
    fn test_payment_lines_mirror_receipt() {
        let lines = vec![line(InstrumentType::Transfer, dec!(75))];
        let items = build_journal_items(
            VoucherKind::Payment,
            &lines,
            CodeNodeId::new(),
            DetailId::new(),
            dec!(75),
            None,
        );

        assert_eq!(items[0].credit, dec!(75));
        assert_eq!(items[1].debit, dec!(75));
        assert!(validate_items(&items).is_ok());
    }
}
