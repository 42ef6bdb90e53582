//! Book payload normalization
//!
//! Clients submit book metadata in two dialects: the feed dialect
//! (`title`, `book_image`, `description`, …) and the stored list-item
//! dialect (`book_name`, `book_cover_photo`, `book_description`, …). Both
//! are accepted at the boundary and collapsed into one canonical record
//! here, with a fixed precedence per field, instead of scattering fallback
//! chains through the services.

use serde::{Deserialize, Serialize};

/// Raw book payload as submitted by a client; every field optional,
/// alternate source keys kept side by side
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookPayload {
    // Identifying ISBN, feed dialect first
    pub primary_isbn13: Option<String>,
    pub book_isbn: Option<String>,
    pub primary_isbn10: Option<String>,

    // Title
    pub title: Option<String>,
    pub book_name: Option<String>,

    // Cover image
    pub book_image: Option<String>,
    pub book_cover_photo: Option<String>,

    // Description
    pub description: Option<String>,
    pub book_description: Option<String>,

    pub author: Option<String>,
    pub publisher: Option<String>,
    pub amazon_product_url: Option<String>,
    pub rank: Option<i32>,
    pub rank_last_week: Option<i32>,
    pub weeks_on_list: Option<i32>,
    pub buy_links: Option<serde_json::Value>,
}

/// Canonical denormalized book record, copied into a list item at insert time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedBook {
    pub book_isbn: String,
    pub book_name: String,
    pub book_cover_photo: String,
    pub book_description: String,
    pub author: String,
    pub publisher: String,
    pub primary_isbn10: String,
    pub primary_isbn13: String,
    pub amazon_product_url: String,
    pub rank: i32,
    pub rank_last_week: i32,
    pub weeks_on_list: i32,
    pub buy_links: serde_json::Value,
}

impl BookPayload {
    /// Collapse the payload into the canonical record.
    ///
    /// Precedence per field (first non-empty wins):
    /// - identifying ISBN: `primary_isbn13`, then `book_isbn`
    /// - name: `title`, then `book_name`
    /// - cover: `book_image`, then `book_cover_photo`
    /// - description: `description`, then `book_description`
    ///
    /// Returns `None` when no identifying ISBN is present.
    pub fn normalize(&self) -> Option<NormalizedBook> {
        let book_isbn = first_non_empty(&[&self.primary_isbn13, &self.book_isbn])?;

        Some(NormalizedBook {
            primary_isbn13: self
                .primary_isbn13
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| book_isbn.clone()),
            book_isbn,
            book_name: first_non_empty(&[&self.title, &self.book_name]).unwrap_or_default(),
            book_cover_photo: first_non_empty(&[&self.book_image, &self.book_cover_photo])
                .unwrap_or_default(),
            book_description: first_non_empty(&[&self.description, &self.book_description])
                .unwrap_or_default(),
            author: self.author.clone().unwrap_or_default(),
            publisher: self.publisher.clone().unwrap_or_default(),
            primary_isbn10: self.primary_isbn10.clone().unwrap_or_default(),
            amazon_product_url: self.amazon_product_url.clone().unwrap_or_default(),
            rank: self.rank.unwrap_or(0),
            rank_last_week: self.rank_last_week.unwrap_or(0),
            weeks_on_list: self.weeks_on_list.unwrap_or(0),
            buy_links: self
                .buy_links
                .clone()
                .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
        })
    }
}

fn first_non_empty(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_dialect_normalizes() {
        let payload = BookPayload {
            primary_isbn13: Some("9780441013593".into()),
            primary_isbn10: Some("0441013597".into()),
            title: Some("Dune".into()),
            book_image: Some("https://img.example/dune.jpg".into()),
            description: Some("Desert planet".into()),
            author: Some("Frank Herbert".into()),
            publisher: Some("Ace".into()),
            ..Default::default()
        };

        let book = payload.normalize().unwrap();
        assert_eq!(book.book_isbn, "9780441013593");
        assert_eq!(book.book_name, "Dune");
        assert_eq!(book.book_cover_photo, "https://img.example/dune.jpg");
        assert_eq!(book.book_description, "Desert planet");
        assert_eq!(book.rank, 0);
    }

    #[test]
    fn test_stored_dialect_normalizes() {
        let payload = BookPayload {
            book_isbn: Some("9780441013593".into()),
            book_name: Some("Dune".into()),
            book_cover_photo: Some("https://img.example/dune.jpg".into()),
            book_description: Some("Desert planet".into()),
            ..Default::default()
        };

        let book = payload.normalize().unwrap();
        assert_eq!(book.book_isbn, "9780441013593");
        // Falls back to the identifying ISBN when no explicit ISBN-13 given
        assert_eq!(book.primary_isbn13, "9780441013593");
        assert_eq!(book.book_name, "Dune");
        assert_eq!(book.book_cover_photo, "https://img.example/dune.jpg");
    }

    #[test]
    fn test_feed_keys_take_precedence() {
        let payload = BookPayload {
            primary_isbn13: Some("9780000000002".into()),
            book_isbn: Some("9780000000001".into()),
            title: Some("Feed Title".into()),
            book_name: Some("Stored Title".into()),
            book_image: Some("feed.jpg".into()),
            book_cover_photo: Some("stored.jpg".into()),
            description: Some("feed desc".into()),
            book_description: Some("stored desc".into()),
            ..Default::default()
        };

        let book = payload.normalize().unwrap();
        assert_eq!(book.book_isbn, "9780000000002");
        assert_eq!(book.book_name, "Feed Title");
        assert_eq!(book.book_cover_photo, "feed.jpg");
        assert_eq!(book.book_description, "feed desc");
    }

    #[test]
    fn test_empty_strings_do_not_win_precedence() {
        let payload = BookPayload {
            book_isbn: Some("9780000000001".into()),
            title: Some(String::new()),
            book_name: Some("Stored Title".into()),
            ..Default::default()
        };

        let book = payload.normalize().unwrap();
        assert_eq!(book.book_name, "Stored Title");
    }

    #[test]
    fn test_missing_isbn_rejected() {
        let payload = BookPayload {
            title: Some("No ISBN".into()),
            ..Default::default()
        };
        assert!(payload.normalize().is_none());
    }

    #[test]
    fn test_buy_links_default_to_empty_array() {
        let payload = BookPayload {
            book_isbn: Some("9780000000001".into()),
            ..Default::default()
        };
        let book = payload.normalize().unwrap();
        assert_eq!(book.buy_links, serde_json::json!([]));
    }
}
