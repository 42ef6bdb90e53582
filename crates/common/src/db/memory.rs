//! In-memory store for tests
//!
//! Implements [`ContentStore`] over plain collections while honoring the
//! same invariants the database schema enforces: the (review, user) upvote
//! pair is unique and drives the counter, the (user, list, isbn) triple is
//! unique per list, and a failed move leaves the source item in place.

use crate::catalog::NormalizedBook;
use crate::db::models::{List, ListItem, Review};
use crate::db::{ContentStore, UpvoteAction, UpvoteOutcome};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct State {
    reviews: Vec<Review>,
    upvotes: HashSet<(Uuid, String)>,
    lists: Vec<List>,
    items: Vec<ListItem>,
}

/// In-memory [`ContentStore`] backed by a single mutex-guarded state
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn item_from_book(list_id: Uuid, user_id: &str, book: &NormalizedBook) -> ListItem {
    ListItem {
        item_id: Uuid::new_v4(),
        list_id,
        user_id: user_id.to_string(),
        book_isbn: book.book_isbn.clone(),
        book_name: book.book_name.clone(),
        book_cover_photo: book.book_cover_photo.clone(),
        book_description: book.book_description.clone(),
        author: book.author.clone(),
        publisher: book.publisher.clone(),
        primary_isbn10: book.primary_isbn10.clone(),
        primary_isbn13: book.primary_isbn13.clone(),
        amazon_product_url: book.amazon_product_url.clone(),
        rank: book.rank,
        rank_last_week: book.rank_last_week,
        weeks_on_list: book.weeks_on_list,
        buy_links: book.buy_links.clone(),
        date_added: chrono::Utc::now().into(),
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert_review(
        &self,
        author_id: &str,
        book_isbn: String,
        review_text: String,
        stars: i32,
    ) -> Result<Review> {
        let now = chrono::Utc::now();
        let review = Review {
            review_id: Uuid::new_v4(),
            user_id: author_id.to_string(),
            book_isbn,
            review_text,
            stars,
            upvotes: 0,
            date_created: now.into(),
            date_modified: now.into(),
        };

        let mut state = self.state.lock().await;
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .iter()
            .find(|r| r.review_id == review_id)
            .cloned())
    }

    async fn reviews_for_book(&self, book_isbn: &str) -> Result<Vec<Review>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.book_isbn == book_isbn)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| {
            b.upvotes
                .cmp(&a.upvotes)
                .then(b.date_created.cmp(&a.date_created))
        });
        Ok(reviews)
    }

    async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<Review>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(reviews)
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        stars: Option<i32>,
        review_text: Option<String>,
    ) -> Result<Review> {
        let mut state = self.state.lock().await;
        let review = state
            .reviews
            .iter_mut()
            .find(|r| r.review_id == review_id)
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        if let Some(stars) = stars {
            review.stars = stars;
        }
        if let Some(text) = review_text {
            review.review_text = text;
        }
        review.date_modified = chrono::Utc::now().into();

        Ok(review.clone())
    }

    async fn delete_review_cascading(&self, review_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.reviews.retain(|r| r.review_id != review_id);
        state.upvotes.retain(|(id, _)| *id != review_id);
        Ok(())
    }

    async fn toggle_upvote(&self, review_id: Uuid, user_id: &str) -> Result<UpvoteOutcome> {
        let mut state = self.state.lock().await;

        if !state.reviews.iter().any(|r| r.review_id == review_id) {
            return Err(AppError::ReviewNotFound {
                id: review_id.to_string(),
            });
        }

        let key = (review_id, user_id.to_string());
        let (action, delta) = if state.upvotes.remove(&key) {
            (UpvoteAction::Removed, -1)
        } else {
            state.upvotes.insert(key);
            (UpvoteAction::Added, 1)
        };

        let review = state
            .reviews
            .iter_mut()
            .find(|r| r.review_id == review_id)
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;
        review.upvotes += delta;

        Ok(UpvoteOutcome {
            review_id,
            upvotes: review.upvotes,
            action,
        })
    }

    async fn lists_for_user(&self, user_id: &str) -> Result<Vec<List>> {
        let state = self.state.lock().await;
        let mut lists: Vec<List> = state
            .lists
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.date_created.cmp(&b.date_created));
        Ok(lists)
    }

    async fn insert_list(&self, user_id: &str, name: String) -> Result<List> {
        let list = List {
            list_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name,
            date_created: chrono::Utc::now().into(),
        };

        let mut state = self.state.lock().await;
        state.lists.push(list.clone());
        Ok(list)
    }

    async fn insert_lists(&self, user_id: &str, names: &[&str]) -> Result<Vec<List>> {
        let mut created = Vec::with_capacity(names.len());
        for name in names {
            created.push(self.insert_list(user_id, (*name).to_string()).await?);
        }
        Ok(created)
    }

    async fn find_owned_list(&self, list_id: Uuid, user_id: &str) -> Result<Option<List>> {
        let state = self.state.lock().await;
        Ok(state
            .lists
            .iter()
            .find(|l| l.list_id == list_id && l.user_id == user_id)
            .cloned())
    }

    async fn items_for_list(&self, list_id: Uuid) -> Result<Vec<ListItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<ListItem> = state
            .items
            .iter()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.date_added.cmp(&b.date_added));
        Ok(items)
    }

    async fn insert_list_item(
        &self,
        list_id: Uuid,
        user_id: &str,
        book: &NormalizedBook,
    ) -> Result<ListItem> {
        let mut state = self.state.lock().await;

        let duplicate = state.items.iter().any(|i| {
            i.user_id == user_id && i.list_id == list_id && i.book_isbn == book.book_isbn
        });
        if duplicate {
            return Err(AppError::DuplicateListItem {
                list_id: list_id.to_string(),
                isbn: book.book_isbn.clone(),
            });
        }

        let item = item_from_book(list_id, user_id, book);
        state.items.push(item.clone());
        Ok(item)
    }

    async fn delete_list_item(
        &self,
        list_id: Uuid,
        user_id: &str,
        book_isbn: &str,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.items.len();
        state.items.retain(|i| {
            !(i.list_id == list_id && i.user_id == user_id && i.book_isbn == book_isbn)
        });
        Ok(state.items.len() < before)
    }

    async fn move_list_item(
        &self,
        user_id: &str,
        source_list_id: Uuid,
        book_isbn: &str,
        target_list_id: Uuid,
    ) -> Result<ListItem> {
        let mut state = self.state.lock().await;

        let position = state
            .items
            .iter()
            .position(|i| {
                i.list_id == source_list_id && i.user_id == user_id && i.book_isbn == book_isbn
            })
            .ok_or_else(|| AppError::ListItemNotFound {
                list_id: source_list_id.to_string(),
                isbn: book_isbn.to_string(),
            })?;

        // The duplicate check precedes the removal: a conflicting target
        // leaves the source item in place, matching the rolled-back
        // transaction of the database-backed store.
        let duplicate = state.items.iter().any(|i| {
            i.user_id == user_id && i.list_id == target_list_id && i.book_isbn == book_isbn
        });
        if duplicate {
            return Err(AppError::DuplicateListItem {
                list_id: target_list_id.to_string(),
                isbn: book_isbn.to_string(),
            });
        }

        let source_item = state.items.remove(position);
        let mut moved = source_item;
        moved.item_id = Uuid::new_v4();
        moved.list_id = target_list_id;
        moved.date_added = chrono::Utc::now().into();

        state.items.push(moved.clone());
        Ok(moved)
    }
}
