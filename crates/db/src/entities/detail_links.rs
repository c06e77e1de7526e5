//! `SeaORM` Entity for the detail_links table (detail ↔ leaf node links).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "detail_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub detail_id: Uuid,
    pub code_node_id: Uuid,
    pub is_primary: bool,
    pub position: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::details::Entity",
        from = "Column::DetailId",
        to = "super::details::Column::Id"
    )]
    Details,
    #[sea_orm(
        belongs_to = "super::code_nodes::Entity",
        from = "Column::CodeNodeId",
        to = "super::code_nodes::Column::Id"
    )]
    CodeNodes,
}

impl Related<super::details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl Related<super::code_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CodeNodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
