//! Treasury instrument domain types.

use daftar_shared::config::NumberingConfig;
use serde::{Deserialize, Serialize};

/// Instrument classes that own a system-managed handler Detail.
///
/// Each class allocates its handler codes from its own configurable offset,
/// keeping the numbering ranges disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentClass {
    /// A bank account.
    BankAccount,
    /// A card reader bound to a bank account.
    CardReader,
    /// A cashbox.
    Cashbox,
}

impl InstrumentClass {
    /// Returns the first candidate handler-detail code for this class.
    #[must_use]
    pub const fn code_offset(self, numbering: &NumberingConfig) -> u16 {
        match self {
            Self::BankAccount => numbering.bank_account_offset,
            Self::CardReader => numbering.card_reader_offset,
            Self::Cashbox => numbering.cashbox_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_offsets_follow_config() {
        let numbering = NumberingConfig::default();
        assert_eq!(
            InstrumentClass::BankAccount.code_offset(&numbering),
            numbering.bank_account_offset
        );
        assert_eq!(
            InstrumentClass::CardReader.code_offset(&numbering),
            numbering.card_reader_offset
        );
        assert_eq!(
            InstrumentClass::Cashbox.code_offset(&numbering),
            numbering.cashbox_offset
        );
    }
}
