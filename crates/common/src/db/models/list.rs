//! Reading list entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub list_id: Uuid,

    /// Opaque identity-provider user id of the owner
    #[sea_orm(column_type = "Text")]
    pub user_id: String,

    /// Display name; defaults are provisioned by presence check, so names
    /// carry no uniqueness constraint
    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub date_created: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::list_item::Entity")]
    Items,
}

impl Related<super::list_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
