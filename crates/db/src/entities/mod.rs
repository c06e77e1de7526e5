//! `SeaORM` entity definitions.

pub mod bank_accounts;
pub mod banks;
pub mod card_readers;
pub mod cashboxes;
pub mod checkbooks;
pub mod checks;
pub mod code_nodes;
pub mod detail_links;
pub mod details;
pub mod fiscal_years;
pub mod journal_items;
pub mod journals;
pub mod organizations;
pub mod payment_items;
pub mod payments;
pub mod receipt_items;
pub mod receipts;
pub mod sea_orm_active_enums;
pub mod settings;
