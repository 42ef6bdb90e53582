//! Reading-list service
//!
//! Personal reading lists: a default triple provisioned on first contact,
//! plus add/remove/move of book snapshots between a user's own lists.
//! List ids are globally unique, so ownership is always checked against
//! the requester before an operation touches a list.

use crate::catalog::BookPayload;
use crate::db::models::{List, ListItem};
use crate::db::ContentStore;
use crate::errors::{AppError, Result};
use crate::metrics;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Lists provisioned for a user who has none yet, in creation order
pub const DEFAULT_LIST_NAMES: [&str; 3] = ["Favorites", "Want to Read", "Already Read"];

/// A list together with its items, in the order books were added
#[derive(Debug, Clone, Serialize)]
pub struct ListWithItems {
    #[serde(flatten)]
    pub list: List,
    pub items: Vec<ListItem>,
}

/// Validate and normalize a user-supplied list name
pub fn normalized_list_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation {
            message: "List name cannot be empty".to_string(),
            field: Some("name".to_string()),
        });
    }
    Ok(trimmed.to_string())
}

/// Reading-list operations over the content store
#[derive(Clone)]
pub struct ListService {
    repo: Arc<dyn ContentStore>,
}

impl ListService {
    pub fn new(repo: Arc<dyn ContentStore>) -> Self {
        Self { repo }
    }

    /// Ensure the user has lists, provisioning the default triple if they
    /// have none at all. Returns all of the user's lists.
    ///
    /// The guard is "any lists exist", not per-name: a user who deleted or
    /// renamed a default list does not get it re-created.
    pub async fn ensure_default_lists(&self, user_id: &str) -> Result<Vec<List>> {
        let existing = self.repo.lists_for_user(user_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let created = self.repo.insert_lists(user_id, &DEFAULT_LIST_NAMES).await?;

        metrics::record_default_lists_provisioned();
        tracing::info!(user_id = %user_id, "Provisioned default reading lists");

        Ok(created)
    }

    /// All of the user's lists with their items, provisioning defaults first
    pub async fn list_user_lists(&self, user_id: &str) -> Result<Vec<ListWithItems>> {
        let lists = self.ensure_default_lists(user_id).await?;

        let mut result = Vec::with_capacity(lists.len());
        for list in lists {
            let items = self.repo.items_for_list(list.list_id).await?;
            result.push(ListWithItems { list, items });
        }
        Ok(result)
    }

    /// Create an additional, empty list
    pub async fn create_list(&self, user_id: &str, name: &str) -> Result<ListWithItems> {
        let name = normalized_list_name(name)?;
        let list = self.repo.insert_list(user_id, name).await?;

        tracing::info!(user_id = %user_id, list_id = %list.list_id, "List created");

        Ok(ListWithItems {
            list,
            items: Vec::new(),
        })
    }

    /// Add a book snapshot to one of the user's lists
    pub async fn add_book(
        &self,
        user_id: &str,
        list_id: Uuid,
        payload: &BookPayload,
    ) -> Result<ListItem> {
        self.owned_list(user_id, list_id).await?;

        let book = payload.normalize().ok_or_else(|| AppError::Validation {
            message: "A book ISBN is required".to_string(),
            field: Some("book_isbn".to_string()),
        })?;

        let item = self.repo.insert_list_item(list_id, user_id, &book).await?;

        metrics::record_list_item_added();
        tracing::info!(
            user_id = %user_id,
            list_id = %list_id,
            book_isbn = %item.book_isbn,
            "Book added to list"
        );

        Ok(item)
    }

    /// Remove a book from one of the user's lists
    pub async fn remove_book(&self, user_id: &str, list_id: Uuid, book_isbn: &str) -> Result<()> {
        self.owned_list(user_id, list_id).await?;

        let removed = self
            .repo
            .delete_list_item(list_id, user_id, book_isbn)
            .await?;
        if !removed {
            return Err(AppError::ListItemNotFound {
                list_id: list_id.to_string(),
                isbn: book_isbn.to_string(),
            });
        }

        tracing::info!(
            user_id = %user_id,
            list_id = %list_id,
            book_isbn = %book_isbn,
            "Book removed from list"
        );

        Ok(())
    }

    /// Move a book between two of the user's lists as one atomic step
    pub async fn move_book(
        &self,
        user_id: &str,
        source_list_id: Uuid,
        book_isbn: &str,
        target_list_id: Uuid,
    ) -> Result<ListItem> {
        self.owned_list(user_id, source_list_id).await?;
        self.owned_list(user_id, target_list_id).await?;

        let item = self
            .repo
            .move_list_item(user_id, source_list_id, book_isbn, target_list_id)
            .await?;

        tracing::info!(
            user_id = %user_id,
            source_list_id = %source_list_id,
            target_list_id = %target_list_id,
            book_isbn = %book_isbn,
            "Book moved between lists"
        );

        Ok(item)
    }

    async fn owned_list(&self, user_id: &str, list_id: Uuid) -> Result<List> {
        self.repo
            .find_owned_list(list_id, user_id)
            .await?
            .ok_or_else(|| AppError::ListNotFound {
                id: list_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> ListService {
        ListService::new(Arc::new(MemoryStore::new()))
    }

    fn dune() -> BookPayload {
        BookPayload {
            primary_isbn13: Some("9780441013593".into()),
            title: Some("Dune".into()),
            author: Some("Frank Herbert".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_list_names() {
        assert_eq!(
            DEFAULT_LIST_NAMES,
            ["Favorites", "Want to Read", "Already Read"]
        );
    }

    #[test]
    fn test_list_name_is_trimmed() {
        assert_eq!(normalized_list_name("  Sci-Fi  ").unwrap(), "Sci-Fi");
    }

    #[test]
    fn test_blank_list_name_rejected() {
        assert!(normalized_list_name("").is_err());
        assert!(normalized_list_name("   ").is_err());
    }

    #[tokio::test]
    async fn test_first_fetch_provisions_three_empty_lists() {
        let svc = service();

        let lists = svc.list_user_lists("u1").await.unwrap();
        assert_eq!(lists.len(), 3);
        for (list, expected) in lists.iter().zip(DEFAULT_LIST_NAMES) {
            assert_eq!(list.list.name, expected);
            assert!(list.items.is_empty());
        }

        // Second fetch must not duplicate
        let again = svc.list_user_lists("u1").await.unwrap();
        assert_eq!(again.len(), 3);
    }

    #[tokio::test]
    async fn test_existing_lists_suppress_provisioning() {
        let svc = service();
        svc.create_list("u1", "Sci-Fi").await.unwrap();

        let lists = svc.ensure_default_lists("u1").await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Sci-Fi");
    }

    #[tokio::test]
    async fn test_duplicate_add_conflicts_and_keeps_one_item() {
        let svc = service();
        let lists = svc.ensure_default_lists("u1").await.unwrap();
        let list_id = lists[0].list_id;

        svc.add_book("u1", list_id, &dune()).await.unwrap();
        let err = svc.add_book("u1", list_id, &dune()).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateListItem { .. }));

        let all = svc.list_user_lists("u1").await.unwrap();
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(all[0].items[0].book_isbn, "9780441013593");
    }

    #[tokio::test]
    async fn test_remove_is_not_idempotent() {
        let svc = service();
        let lists = svc.ensure_default_lists("u1").await.unwrap();
        let list_id = lists[0].list_id;

        svc.add_book("u1", list_id, &dune()).await.unwrap();
        svc.remove_book("u1", list_id, "9780441013593")
            .await
            .unwrap();

        let err = svc
            .remove_book("u1", list_id, "9780441013593")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ListItemNotFound { .. }));
    }

    #[tokio::test]
    async fn test_move_transfers_item_with_metadata() {
        let svc = service();
        let lists = svc.ensure_default_lists("u1").await.unwrap();
        let (source, target) = (lists[0].list_id, lists[1].list_id);

        svc.add_book("u1", source, &dune()).await.unwrap();
        let moved = svc
            .move_book("u1", source, "9780441013593", target)
            .await
            .unwrap();
        assert_eq!(moved.list_id, target);
        assert_eq!(moved.book_name, "Dune");
        assert_eq!(moved.author, "Frank Herbert");

        let all = svc.list_user_lists("u1").await.unwrap();
        assert!(all[0].items.is_empty());
        assert_eq!(all[1].items.len(), 1);
        assert_eq!(all[1].items[0].book_isbn, "9780441013593");
    }

    #[tokio::test]
    async fn test_move_into_conflicting_list_keeps_source() {
        let svc = service();
        let lists = svc.ensure_default_lists("u1").await.unwrap();
        let (source, target) = (lists[0].list_id, lists[1].list_id);

        svc.add_book("u1", source, &dune()).await.unwrap();
        svc.add_book("u1", target, &dune()).await.unwrap();

        let err = svc
            .move_book("u1", source, "9780441013593", target)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateListItem { .. }));

        // The book must not vanish from the source list
        let all = svc.list_user_lists("u1").await.unwrap();
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(all[1].items.len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_list_is_invisible() {
        let svc = service();
        let lists = svc.ensure_default_lists("u1").await.unwrap();
        let list_id = lists[0].list_id;

        let err = svc.add_book("u2", list_id, &dune()).await.unwrap_err();
        assert!(matches!(err, AppError::ListNotFound { .. }));
    }
}
