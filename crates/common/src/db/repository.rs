//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling and transaction support. All mutual exclusion for the
//! upvote counter and list-item uniqueness is delegated to the database:
//! unique constraints, and row locks inside transactions.
//!
//! The review and reading-list services depend on the [`ContentStore`]
//! trait rather than the concrete [`Repository`], so they can be exercised
//! against the in-memory store in tests.

use crate::catalog::NormalizedBook;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a completed upvote toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpvoteAction {
    Added,
    Removed,
}

/// Result of an upvote toggle: the authoritative post-transition counter
/// and the transition taken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpvoteOutcome {
    pub review_id: Uuid,
    pub upvotes: i32,
    pub action: UpvoteAction,
}

/// Data-access seam for the review and reading-list services
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a new review with a zero upvote counter
    async fn insert_review(
        &self,
        author_id: &str,
        book_isbn: String,
        review_text: String,
        stars: i32,
    ) -> Result<Review>;

    /// Find review by ID
    async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>>;

    /// Reviews for a book, most-upvoted then most-recent first
    async fn reviews_for_book(&self, book_isbn: &str) -> Result<Vec<Review>>;

    /// Reviews by a user, most-recent first
    async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>>;

    /// Apply a partial update to a review and bump its modified timestamp.
    /// Ownership is checked by the caller before this runs.
    async fn update_review(
        &self,
        review_id: Uuid,
        stars: Option<i32>,
        review_text: Option<String>,
    ) -> Result<Review>;

    /// Hard-delete a review together with its upvote rows
    async fn delete_review_cascading(&self, review_id: Uuid) -> Result<()>;

    /// Flip the (review, user) upvote state and adjust the denormalized
    /// counter in lockstep
    async fn toggle_upvote(&self, review_id: Uuid, user_id: &str) -> Result<UpvoteOutcome>;

    /// All lists for a user, oldest first (defaults keep their creation order)
    async fn lists_for_user(&self, user_id: &str) -> Result<Vec<List>>;

    /// Create a single list
    async fn insert_list(&self, user_id: &str, name: String) -> Result<List>;

    /// Create several lists in the given order
    async fn insert_lists(&self, user_id: &str, names: &[&str]) -> Result<Vec<List>>;

    /// Find a list only if it belongs to the given user
    async fn find_owned_list(&self, list_id: Uuid, user_id: &str) -> Result<Option<List>>;

    /// Items of a list, in the order the books were added
    async fn items_for_list(&self, list_id: Uuid) -> Result<Vec<ListItem>>;

    /// Insert a book into a list, copying the denormalized metadata.
    /// A duplicate (user, list, isbn) triple surfaces as a conflict.
    async fn insert_list_item(
        &self,
        list_id: Uuid,
        user_id: &str,
        book: &NormalizedBook,
    ) -> Result<ListItem>;

    /// Remove a book from a list; Ok(false) when no matching item existed
    async fn delete_list_item(
        &self,
        list_id: Uuid,
        user_id: &str,
        book_isbn: &str,
    ) -> Result<bool>;

    /// Move a book between two lists of the same user as one atomic step
    async fn move_list_item(
        &self,
        user_id: &str,
        source_list_id: Uuid,
        book_isbn: &str,
        target_list_id: Uuid,
    ) -> Result<ListItem>;
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Wipe all review and list content
    pub async fn reset_content(&self) -> Result<()> {
        self.write_conn()
            .execute_unprepared(
                "TRUNCATE TABLE upvotes, reviews, list_items, lists RESTART IDENTITY CASCADE",
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for Repository {
    async fn insert_review(
        &self,
        author_id: &str,
        book_isbn: String,
        review_text: String,
        stars: i32,
    ) -> Result<Review> {
        let now = chrono::Utc::now();

        let review = ReviewActiveModel {
            review_id: Set(Uuid::new_v4()),
            user_id: Set(author_id.to_string()),
            book_isbn: Set(book_isbn),
            review_text: Set(review_text),
            stars: Set(stars),
            upvotes: Set(0),
            date_created: Set(now.into()),
            date_modified: Set(now.into()),
        };

        review.insert(self.write_conn()).await.map_err(Into::into)
    }

    async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>> {
        ReviewEntity::find_by_id(review_id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn reviews_for_book(&self, book_isbn: &str) -> Result<Vec<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::BookIsbn.eq(book_isbn))
            .order_by_desc(ReviewColumn::Upvotes)
            .order_by_desc(ReviewColumn::DateCreated)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::UserId.eq(user_id))
            .order_by_desc(ReviewColumn::DateCreated)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        stars: Option<i32>,
        review_text: Option<String>,
    ) -> Result<Review> {
        let mut review: ReviewActiveModel = ReviewEntity::find_by_id(review_id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?
            .into();

        if let Some(stars) = stars {
            review.stars = Set(stars);
        }
        if let Some(text) = review_text {
            review.review_text = Set(text);
        }
        review.date_modified = Set(chrono::Utc::now().into());

        review.update(self.write_conn()).await.map_err(Into::into)
    }

    async fn delete_review_cascading(&self, review_id: Uuid) -> Result<()> {
        let txn = self.write_conn().begin().await?;

        UpvoteEntity::delete_many()
            .filter(UpvoteColumn::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;

        ReviewEntity::delete_by_id(review_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// The whole check-and-mutate runs in one transaction with the review
    /// row locked, so concurrent toggles from the same user converge on a
    /// counter consistent with the row count.
    async fn toggle_upvote(&self, review_id: Uuid, user_id: &str) -> Result<UpvoteOutcome> {
        let txn = self.write_conn().begin().await?;

        // Lock the review row for the duration of the toggle
        let locked = txn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT upvotes FROM reviews WHERE review_id = $1 FOR UPDATE",
                vec![review_id.into()],
            ))
            .await?;

        if locked.is_none() {
            txn.rollback().await?;
            return Err(AppError::ReviewNotFound {
                id: review_id.to_string(),
            });
        }

        let existing = UpvoteEntity::find()
            .filter(UpvoteColumn::ReviewId.eq(review_id))
            .filter(UpvoteColumn::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let (action, delta) = match existing {
            Some(upvote) => {
                UpvoteEntity::delete_by_id((upvote.review_id, upvote.user_id))
                    .exec(&txn)
                    .await?;
                (UpvoteAction::Removed, -1)
            }
            None => {
                let upvote = UpvoteActiveModel {
                    review_id: Set(review_id),
                    user_id: Set(user_id.to_string()),
                };
                upvote.insert(&txn).await?;
                (UpvoteAction::Added, 1)
            }
        };

        let updated = txn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "UPDATE reviews SET upvotes = upvotes + $1 WHERE review_id = $2 RETURNING upvotes",
                vec![delta.into(), review_id.into()],
            ))
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        let upvotes: i32 = updated.try_get_by_index(0)?;

        txn.commit().await?;

        Ok(UpvoteOutcome {
            review_id,
            upvotes,
            action,
        })
    }

    async fn lists_for_user(&self, user_id: &str) -> Result<Vec<List>> {
        ListEntity::find()
            .filter(ListColumn::UserId.eq(user_id))
            .order_by_asc(ListColumn::DateCreated)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn insert_list(&self, user_id: &str, name: String) -> Result<List> {
        let list = ListActiveModel {
            list_id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            name: Set(name),
            date_created: Set(chrono::Utc::now().into()),
        };

        list.insert(self.write_conn()).await.map_err(Into::into)
    }

    async fn insert_lists(&self, user_id: &str, names: &[&str]) -> Result<Vec<List>> {
        let mut created = Vec::with_capacity(names.len());
        for name in names {
            created.push(self.insert_list(user_id, (*name).to_string()).await?);
        }
        Ok(created)
    }

    async fn find_owned_list(&self, list_id: Uuid, user_id: &str) -> Result<Option<List>> {
        ListEntity::find_by_id(list_id)
            .filter(ListColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn items_for_list(&self, list_id: Uuid) -> Result<Vec<ListItem>> {
        ListItemEntity::find()
            .filter(ListItemColumn::ListId.eq(list_id))
            .order_by_asc(ListItemColumn::DateAdded)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn insert_list_item(
        &self,
        list_id: Uuid,
        user_id: &str,
        book: &NormalizedBook,
    ) -> Result<ListItem> {
        let item = new_item_model(list_id, user_id, book);

        item.insert(self.write_conn())
            .await
            .map_err(|e| translate_item_insert_err(e, list_id, &book.book_isbn))
    }

    async fn delete_list_item(
        &self,
        list_id: Uuid,
        user_id: &str,
        book_isbn: &str,
    ) -> Result<bool> {
        let result = ListItemEntity::delete_many()
            .filter(ListItemColumn::ListId.eq(list_id))
            .filter(ListItemColumn::UserId.eq(user_id))
            .filter(ListItemColumn::BookIsbn.eq(book_isbn))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Delete-from-source and insert-into-target run in one transaction so
    /// a mid-operation failure cannot make the book vanish from both lists.
    async fn move_list_item(
        &self,
        user_id: &str,
        source_list_id: Uuid,
        book_isbn: &str,
        target_list_id: Uuid,
    ) -> Result<ListItem> {
        let txn = self.write_conn().begin().await?;

        let source_item = ListItemEntity::find()
            .filter(ListItemColumn::ListId.eq(source_list_id))
            .filter(ListItemColumn::UserId.eq(user_id))
            .filter(ListItemColumn::BookIsbn.eq(book_isbn))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::ListItemNotFound {
                list_id: source_list_id.to_string(),
                isbn: book_isbn.to_string(),
            })?;

        ListItemEntity::delete_by_id(source_item.item_id)
            .exec(&txn)
            .await?;

        let moved = ListItemActiveModel {
            item_id: Set(Uuid::new_v4()),
            list_id: Set(target_list_id),
            user_id: Set(user_id.to_string()),
            book_isbn: Set(source_item.book_isbn.clone()),
            book_name: Set(source_item.book_name),
            book_cover_photo: Set(source_item.book_cover_photo),
            book_description: Set(source_item.book_description),
            author: Set(source_item.author),
            publisher: Set(source_item.publisher),
            primary_isbn10: Set(source_item.primary_isbn10),
            primary_isbn13: Set(source_item.primary_isbn13),
            amazon_product_url: Set(source_item.amazon_product_url),
            rank: Set(source_item.rank),
            rank_last_week: Set(source_item.rank_last_week),
            weeks_on_list: Set(source_item.weeks_on_list),
            buy_links: Set(source_item.buy_links),
            date_added: Set(chrono::Utc::now().into()),
        };

        let inserted = moved
            .insert(&txn)
            .await
            .map_err(|e| translate_item_insert_err(e, target_list_id, book_isbn))?;

        txn.commit().await?;
        Ok(inserted)
    }
}

fn new_item_model(list_id: Uuid, user_id: &str, book: &NormalizedBook) -> ListItemActiveModel {
    ListItemActiveModel {
        item_id: Set(Uuid::new_v4()),
        list_id: Set(list_id),
        user_id: Set(user_id.to_string()),
        book_isbn: Set(book.book_isbn.clone()),
        book_name: Set(book.book_name.clone()),
        book_cover_photo: Set(book.book_cover_photo.clone()),
        book_description: Set(book.book_description.clone()),
        author: Set(book.author.clone()),
        publisher: Set(book.publisher.clone()),
        primary_isbn10: Set(book.primary_isbn10.clone()),
        primary_isbn13: Set(book.primary_isbn13.clone()),
        amazon_product_url: Set(book.amazon_product_url.clone()),
        rank: Set(book.rank),
        rank_last_week: Set(book.rank_last_week),
        weeks_on_list: Set(book.weeks_on_list),
        buy_links: Set(book.buy_links.clone()),
        date_added: Set(chrono::Utc::now().into()),
    }
}

fn translate_item_insert_err(err: DbErr, list_id: Uuid, book_isbn: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateListItem {
            list_id: list_id.to_string(),
            isbn: book_isbn.to_string(),
        },
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upvote_action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UpvoteAction::Added).unwrap(),
            "\"added\""
        );
        assert_eq!(
            serde_json::to_string(&UpvoteAction::Removed).unwrap(),
            "\"removed\""
        );
    }

    #[test]
    fn test_outcome_round_trips() {
        let outcome = UpvoteOutcome {
            review_id: Uuid::new_v4(),
            upvotes: 3,
            action: UpvoteAction::Added,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["upvotes"], 3);
        assert_eq!(json["action"], "added");
    }
}
