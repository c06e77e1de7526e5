//! `SeaORM` Entity for the journal_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub journal_id: Uuid,
    pub code_node_id: Uuid,
    /// Counterparty reference; parties are an external module.
    pub party_id: Option<Uuid>,
    pub detail_id: Option<Uuid>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journals::Entity",
        from = "Column::JournalId",
        to = "super::journals::Column::Id"
    )]
    Journals,
    #[sea_orm(
        belongs_to = "super::code_nodes::Entity",
        from = "Column::CodeNodeId",
        to = "super::code_nodes::Column::Id"
    )]
    CodeNodes,
    #[sea_orm(
        belongs_to = "super::details::Entity",
        from = "Column::DetailId",
        to = "super::details::Column::Id"
    )]
    Details,
}

impl Related<super::journals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journals.def()
    }
}

impl Related<super::code_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CodeNodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
