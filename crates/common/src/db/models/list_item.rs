//! Reading-list item entity
//!
//! Book metadata is denormalized into the item at insert time because the
//! catalog is external and never locally mastered. Uniqueness is enforced
//! on (user_id, list_id, book_isbn).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "list_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: Uuid,

    pub list_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub book_isbn: String,

    #[sea_orm(column_type = "Text")]
    pub book_name: String,

    #[sea_orm(column_type = "Text")]
    pub book_cover_photo: String,

    #[sea_orm(column_type = "Text")]
    pub book_description: String,

    #[sea_orm(column_type = "Text")]
    pub author: String,

    #[sea_orm(column_type = "Text")]
    pub publisher: String,

    #[sea_orm(column_type = "Text")]
    pub primary_isbn10: String,

    #[sea_orm(column_type = "Text")]
    pub primary_isbn13: String,

    #[sea_orm(column_type = "Text")]
    pub amazon_product_url: String,

    pub rank: i32,

    pub rank_last_week: i32,

    pub weeks_on_list: i32,

    /// Provider buy links, stored as-is
    #[sea_orm(column_type = "JsonBinary")]
    pub buy_links: serde_json::Value,

    pub date_added: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::list::Entity",
        from = "Column::ListId",
        to = "super::list::Column::ListId"
    )]
    List,
}

impl Related<super::list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::List.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
