//! `SeaORM` Entity for the checks table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CheckKind, CheckStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "checks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: CheckKind,
    /// Set for outgoing checks drawn from a checkbook.
    pub checkbook_id: Option<Uuid>,
    pub number: i64,
    pub amount: Decimal,
    pub issue_date: Date,
    pub due_date: Date,
    /// Counterparty detail; used as the ledger detail for check lines.
    pub beneficiary_detail_id: Option<Uuid>,
    pub status: CheckStatus,
    /// Stamped when a receipt deposits the check into a cashbox.
    pub cashbox_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checkbooks::Entity",
        from = "Column::CheckbookId",
        to = "super::checkbooks::Column::Id"
    )]
    Checkbooks,
    #[sea_orm(
        belongs_to = "super::cashboxes::Entity",
        from = "Column::CashboxId",
        to = "super::cashboxes::Column::Id"
    )]
    Cashboxes,
    #[sea_orm(
        belongs_to = "super::details::Entity",
        from = "Column::BeneficiaryDetailId",
        to = "super::details::Column::Id"
    )]
    Details,
}

impl Related<super::checkbooks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checkbooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
