//! `SeaORM` Entity for the receipts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::VoucherStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Sequential number, scoped to the organization.
    pub number: i64,
    pub status: VoucherStatus,
    pub receipt_date: Date,
    pub fiscal_year_id: Uuid,
    /// Counterparty detail.
    pub detail_id: Uuid,
    /// Optional explicit counterparty code, overriding the resolved one.
    pub special_code_id: Option<Uuid>,
    /// Required when any item is handled through a cashbox.
    pub cashbox_id: Option<Uuid>,
    pub total_amount: Decimal,
    /// Stamped with the compiled journal when posted.
    pub journal_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fiscal_years::Entity",
        from = "Column::FiscalYearId",
        to = "super::fiscal_years::Column::Id"
    )]
    FiscalYears,
    #[sea_orm(
        belongs_to = "super::details::Entity",
        from = "Column::DetailId",
        to = "super::details::Column::Id"
    )]
    Details,
    #[sea_orm(
        belongs_to = "super::journals::Entity",
        from = "Column::JournalId",
        to = "super::journals::Column::Id"
    )]
    Journals,
    #[sea_orm(has_many = "super::receipt_items::Entity")]
    ReceiptItems,
}

impl Related<super::receipt_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
