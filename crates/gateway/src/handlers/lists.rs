//! Reading-list handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use readup_common::{
    auth::AuthContext,
    catalog::BookPayload,
    db::models::ListItem,
    errors::Result,
    lists::ListWithItems,
};

/// Request to create an additional list
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

/// Request to add a book to a list; the snapshot arrives under a `book` key
#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub book: BookPayload,
}

/// All of the requester's lists with their items.
///
/// A first-time caller gets the default lists provisioned before the
/// response is built.
pub async fn get_lists(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<ListWithItems>>> {
    let lists = state.lists.list_user_lists(&auth.user_id).await?;
    Ok(Json(lists))
}

/// Create an additional, empty list
pub async fn create_list(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListWithItems>)> {
    let list = state.lists.create_list(&auth.user_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Add a book snapshot to one of the requester's lists
pub async fn add_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(list_id): Path<Uuid>,
    Json(request): Json<AddBookRequest>,
) -> Result<(StatusCode, Json<ListItem>)> {
    let item = state
        .lists
        .add_book(&auth.user_id, list_id, &request.book)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove a book from one of the requester's lists
pub async fn remove_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((list_id, book_isbn)): Path<(Uuid, String)>,
) -> Result<StatusCode> {
    state
        .lists
        .remove_book(&auth.user_id, list_id, &book_isbn)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a book from one of the requester's lists to another
pub async fn move_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((list_id, book_isbn, target_list_id)): Path<(Uuid, String, Uuid)>,
) -> Result<Json<ListItem>> {
    let item = state
        .lists
        .move_book(&auth.user_id, list_id, &book_isbn, target_list_id)
        .await?;
    Ok(Json(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_book_body_carries_book_key() {
        let request: AddBookRequest = serde_json::from_value(json!({
            "book": {
                "primary_isbn13": "9780441013593",
                "title": "Dune",
                "author": "Frank Herbert"
            }
        }))
        .unwrap();

        let book = request.book.normalize().unwrap();
        assert_eq!(book.book_isbn, "9780441013593");
        assert_eq!(book.book_name, "Dune");
        assert_eq!(book.author, "Frank Herbert");
    }

    #[test]
    fn test_add_book_body_without_book_key_rejected() {
        let result: std::result::Result<AddBookRequest, _> = serde_json::from_value(json!({
            "primary_isbn13": "9780441013593",
            "title": "Dune"
        }));
        assert!(result.is_err());
    }
}
