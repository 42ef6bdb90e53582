//! Review entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub review_id: Uuid,

    /// Opaque identity-provider user id of the author
    #[sea_orm(column_type = "Text")]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub book_isbn: String,

    #[sea_orm(column_type = "Text")]
    pub review_text: String,

    /// Star rating, always within 1..=5
    pub stars: i32,

    /// Derived counter; kept in lockstep with the upvotes join table
    pub upvotes: i32,

    pub date_created: DateTimeWithTimeZone,

    pub date_modified: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::upvote::Entity")]
    Upvotes,
}

impl Related<super::upvote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Upvotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
