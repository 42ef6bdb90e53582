//! SeaORM entity models
//!
//! Database entities for ReadUp

mod list;
mod list_item;
mod review;
mod upvote;

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
};

pub use upvote::{
    Entity as UpvoteEntity,
    Model as Upvote,
    ActiveModel as UpvoteActiveModel,
    Column as UpvoteColumn,
};

pub use list::{
    Entity as ListEntity,
    Model as List,
    ActiveModel as ListActiveModel,
    Column as ListColumn,
};

pub use list_item::{
    Entity as ListItemEntity,
    Model as ListItem,
    ActiveModel as ListItemActiveModel,
    Column as ListItemColumn,
};
