//! Database enum types mirrored from the Postgres schema.
//!
//! Conversions to and from the core domain enums live here so repositories
//! map rows into validated domain values at the persistence boundary.

use daftar_core::catalog;
use daftar_core::journal;
use daftar_core::posting;
use daftar_core::treasury::{check, checkbook};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hierarchy level of a chart-of-accounts node.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "code_kind")]
pub enum CodeKind {
    /// Top-level grouping.
    #[sea_orm(string_value = "group")]
    Group,
    /// Mid-level account under a group.
    #[sea_orm(string_value = "general")]
    General,
    /// Leaf-level account under a general.
    #[sea_orm(string_value = "specific")]
    Specific,
}

impl From<catalog::CodeKind> for CodeKind {
    fn from(kind: catalog::CodeKind) -> Self {
        match kind {
            catalog::CodeKind::Group => Self::Group,
            catalog::CodeKind::General => Self::General,
            catalog::CodeKind::Specific => Self::Specific,
        }
    }
}

impl From<CodeKind> for catalog::CodeKind {
    fn from(kind: CodeKind) -> Self {
        match kind {
            CodeKind::Group => Self::Group,
            CodeKind::General => Self::General,
            CodeKind::Specific => Self::Specific,
        }
    }
}

/// Natural balance side of an account node.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_nature")]
pub enum AccountNature {
    /// Debit-normal account.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Credit-normal account.
    #[sea_orm(string_value = "credit")]
    Credit,
}

impl From<catalog::AccountNature> for AccountNature {
    fn from(nature: catalog::AccountNature) -> Self {
        match nature {
            catalog::AccountNature::Debit => Self::Debit,
            catalog::AccountNature::Credit => Self::Credit,
        }
    }
}

impl From<AccountNature> for catalog::AccountNature {
    fn from(nature: AccountNature) -> Self {
        match nature {
            AccountNature::Debit => Self::Debit,
            AccountNature::Credit => Self::Credit,
        }
    }
}

/// Origin of a detail catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "detail_kind")]
pub enum DetailKind {
    /// Created through the generic detail API.
    #[sea_orm(string_value = "user_defined")]
    UserDefined,
    /// Created and owned by the treasury subsystem.
    #[sea_orm(string_value = "system_managed")]
    SystemManaged,
}

impl From<catalog::DetailKind> for DetailKind {
    fn from(kind: catalog::DetailKind) -> Self {
        match kind {
            catalog::DetailKind::UserDefined => Self::UserDefined,
            catalog::DetailKind::SystemManaged => Self::SystemManaged,
        }
    }
}

impl From<DetailKind> for catalog::DetailKind {
    fn from(kind: DetailKind) -> Self {
        match kind {
            DetailKind::UserDefined => Self::UserDefined,
            DetailKind::SystemManaged => Self::SystemManaged,
        }
    }
}

/// Journal lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
pub enum JournalStatus {
    /// Editable draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Posted to the ledger, immutable.
    #[sea_orm(string_value = "posted")]
    Posted,
}

impl From<journal::JournalStatus> for JournalStatus {
    fn from(status: journal::JournalStatus) -> Self {
        match status {
            journal::JournalStatus::Draft => Self::Draft,
            journal::JournalStatus::Posted => Self::Posted,
        }
    }
}

impl From<JournalStatus> for journal::JournalStatus {
    fn from(status: JournalStatus) -> Self {
        match status {
            JournalStatus::Draft => Self::Draft,
            JournalStatus::Posted => Self::Posted,
        }
    }
}

/// Receipt/payment lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "voucher_status")]
pub enum VoucherStatus {
    /// Editable draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Compiled into a journal, terminal.
    #[sea_orm(string_value = "sent")]
    Sent,
}

impl From<posting::VoucherStatus> for VoucherStatus {
    fn from(status: posting::VoucherStatus) -> Self {
        match status {
            posting::VoucherStatus::Draft => Self::Draft,
            posting::VoucherStatus::Sent => Self::Sent,
        }
    }
}

impl From<VoucherStatus> for posting::VoucherStatus {
    fn from(status: VoucherStatus) -> Self {
        match status {
            VoucherStatus::Draft => Self::Draft,
            VoucherStatus::Sent => Self::Sent,
        }
    }
}

/// Payment instrument referenced by a voucher item.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "instrument_type")]
pub enum InstrumentType {
    /// Cash through a cashbox.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Card through a card reader.
    #[sea_orm(string_value = "card")]
    Card,
    /// Bank transfer.
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Check (incoming on receipts, outgoing on payments).
    #[sea_orm(string_value = "check")]
    Check,
    /// Spending an in-cashbox incoming check (payments only).
    #[sea_orm(string_value = "checkin")]
    Checkin,
}

impl From<posting::InstrumentType> for InstrumentType {
    fn from(instrument: posting::InstrumentType) -> Self {
        match instrument {
            posting::InstrumentType::Cash => Self::Cash,
            posting::InstrumentType::Card => Self::Card,
            posting::InstrumentType::Transfer => Self::Transfer,
            posting::InstrumentType::Check => Self::Check,
            posting::InstrumentType::Checkin => Self::Checkin,
        }
    }
}

impl From<InstrumentType> for posting::InstrumentType {
    fn from(instrument: InstrumentType) -> Self {
        match instrument {
            InstrumentType::Cash => Self::Cash,
            InstrumentType::Card => Self::Card,
            InstrumentType::Transfer => Self::Transfer,
            InstrumentType::Check => Self::Check,
            InstrumentType::Checkin => Self::Checkin,
        }
    }
}

/// Direction of a check.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "check_kind")]
pub enum CheckKind {
    /// Received from a counterparty.
    #[sea_orm(string_value = "incoming")]
    Incoming,
    /// Drawn from one of our checkbooks.
    #[sea_orm(string_value = "outgoing")]
    Outgoing,
}

impl From<check::CheckKind> for CheckKind {
    fn from(kind: check::CheckKind) -> Self {
        match kind {
            check::CheckKind::Incoming => Self::Incoming,
            check::CheckKind::Outgoing => Self::Outgoing,
        }
    }
}

impl From<CheckKind> for check::CheckKind {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Incoming => Self::Incoming,
            CheckKind::Outgoing => Self::Outgoing,
        }
    }
}

/// Check lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "check_status")]
pub enum CheckStatus {
    /// Incoming check received, not yet deposited.
    #[sea_orm(string_value = "created")]
    Created,
    /// Incoming check recorded in a cashbox.
    #[sea_orm(string_value = "incashbox")]
    InCashbox,
    /// Outgoing check drawn from a checkbook.
    #[sea_orm(string_value = "issued")]
    Issued,
    /// Consumed by a payment.
    #[sea_orm(string_value = "spent")]
    Spent,
}

impl From<check::CheckStatus> for CheckStatus {
    fn from(status: check::CheckStatus) -> Self {
        match status {
            check::CheckStatus::Created => Self::Created,
            check::CheckStatus::InCashbox => Self::InCashbox,
            check::CheckStatus::Issued => Self::Issued,
            check::CheckStatus::Spent => Self::Spent,
        }
    }
}

impl From<CheckStatus> for check::CheckStatus {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Created => Self::Created,
            CheckStatus::InCashbox => Self::InCashbox,
            CheckStatus::Issued => Self::Issued,
            CheckStatus::Spent => Self::Spent,
        }
    }
}

/// Checkbook status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "checkbook_status")]
pub enum CheckbookStatus {
    /// Pages remain to be issued.
    #[sea_orm(string_value = "active")]
    Active,
    /// The last page has been issued.
    #[sea_orm(string_value = "exhausted")]
    Exhausted,
}

impl From<checkbook::CheckbookStatus> for CheckbookStatus {
    fn from(status: checkbook::CheckbookStatus) -> Self {
        match status {
            checkbook::CheckbookStatus::Active => Self::Active,
            checkbook::CheckbookStatus::Exhausted => Self::Exhausted,
        }
    }
}

impl From<CheckbookStatus> for checkbook::CheckbookStatus {
    fn from(status: CheckbookStatus) -> Self {
        match status {
            CheckbookStatus::Active => Self::Active,
            CheckbookStatus::Exhausted => Self::Exhausted,
        }
    }
}
