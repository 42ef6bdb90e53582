//! API handlers module

pub mod admin;
pub mod books;
pub mod health;
pub mod lists;
pub mod reviews;
