//! Search-response adapter
//!
//! The volume search provider returns its own shape; the client application
//! only understands the bestseller feed's `results.lists[].books[]` layout.
//! This adapter maps a volume response onto a single synthetic
//! "Search Results" list in that layout.

use super::{Volume, VolumesResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A volume search response reshaped into the bestseller feed layout
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchFeed {
    pub status: String,
    pub num_results: u64,
    pub results: FeedResults,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResults {
    pub bestsellers_date: String,
    pub published_date: String,
    pub lists: Vec<FeedList>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedList {
    pub list_id: u32,
    pub list_name: String,
    pub display_name: String,
    pub updated: String,
    pub books: Vec<FeedBook>,
}

/// Canonical book record in the feed shape
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedBook {
    pub age_group: String,
    pub amazon_product_url: String,
    pub article_chapter_link: String,
    pub author: String,
    pub book_image: String,
    pub book_image_width: u32,
    pub book_image_height: u32,
    pub book_review_link: String,
    pub contributor: String,
    pub contributor_note: String,
    pub created_date: String,
    pub description: String,
    pub first_chapter_link: String,
    pub price: String,
    pub primary_isbn10: String,
    pub primary_isbn13: String,
    pub book_uri: String,
    pub publisher: String,
    pub rank: u32,
    pub rank_last_week: u32,
    pub sunday_review_link: String,
    pub title: String,
    pub updated_date: String,
    pub weeks_on_list: u32,
    pub buy_links: Vec<serde_json::Value>,
}

/// Transform a provider-native volume response into the feed shape
pub fn feed_from_search(volumes: &VolumesResponse) -> SearchFeed {
    SearchFeed {
        status: "OK".to_string(),
        num_results: volumes.total_items,
        results: FeedResults {
            bestsellers_date: String::new(),
            published_date: String::new(),
            lists: vec![FeedList {
                list_id: 1,
                list_name: "Search Results".to_string(),
                display_name: "Search Results".to_string(),
                updated: "WEEKLY".to_string(),
                books: volumes.items.iter().map(feed_book_from_volume).collect(),
            }],
        },
    }
}

fn feed_book_from_volume(volume: &Volume) -> FeedBook {
    let info = &volume.volume_info;

    let isbn13 = identifier_of_type(volume, "ISBN_13");
    let isbn10 = identifier_of_type(volume, "ISBN_10");

    let author = if info.authors.is_empty() {
        "Unknown Author".to_string()
    } else {
        info.authors.join(", ")
    };

    let now = Utc::now().to_rfc3339();

    FeedBook {
        age_group: String::new(),
        amazon_product_url: String::new(),
        article_chapter_link: String::new(),
        contributor: format!("by {}", author),
        author,
        book_image: info
            .image_links
            .as_ref()
            .map(|links| links.thumbnail.clone())
            .unwrap_or_default(),
        book_image_width: 0,
        book_image_height: 0,
        book_review_link: String::new(),
        contributor_note: String::new(),
        created_date: now.clone(),
        description: info.description.clone(),
        first_chapter_link: String::new(),
        price: String::new(),
        primary_isbn10: isbn10,
        primary_isbn13: isbn13,
        book_uri: volume.self_link.clone(),
        publisher: info.publisher.clone(),
        rank: 0,
        rank_last_week: 0,
        sunday_review_link: String::new(),
        title: info.title.clone(),
        updated_date: now,
        weeks_on_list: 0,
        buy_links: Vec::new(),
    }
}

fn identifier_of_type(volume: &Volume, id_type: &str) -> String {
    volume
        .volume_info
        .industry_identifiers
        .iter()
        .find(|id| id.id_type == id_type)
        .map(|id| id.identifier.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ImageLinks, IndustryIdentifier, VolumeInfo};

    fn sample_volume() -> Volume {
        Volume {
            self_link: "https://books.example/volumes/abc".into(),
            volume_info: VolumeInfo {
                title: "Dune".into(),
                authors: vec!["Frank Herbert".into()],
                publisher: "Ace".into(),
                description: "Desert planet".into(),
                industry_identifiers: vec![
                    IndustryIdentifier {
                        id_type: "ISBN_10".into(),
                        identifier: "0441013597".into(),
                    },
                    IndustryIdentifier {
                        id_type: "ISBN_13".into(),
                        identifier: "9780441013593".into(),
                    },
                ],
                image_links: Some(ImageLinks {
                    thumbnail: "https://img.example/dune.jpg".into(),
                }),
            },
        }
    }

    #[test]
    fn test_feed_shape_has_single_search_list() {
        let volumes = VolumesResponse {
            total_items: 1,
            items: vec![sample_volume()],
        };

        let feed = feed_from_search(&volumes);
        assert_eq!(feed.status, "OK");
        assert_eq!(feed.num_results, 1);
        assert_eq!(feed.results.lists.len(), 1);
        assert_eq!(feed.results.lists[0].list_name, "Search Results");
        assert_eq!(feed.results.lists[0].books.len(), 1);
    }

    #[test]
    fn test_volume_fields_mapped_onto_book_record() {
        let volumes = VolumesResponse {
            total_items: 1,
            items: vec![sample_volume()],
        };

        let feed = feed_from_search(&volumes);
        let book = &feed.results.lists[0].books[0];
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.contributor, "by Frank Herbert");
        assert_eq!(book.primary_isbn13, "9780441013593");
        assert_eq!(book.primary_isbn10, "0441013597");
        assert_eq!(book.book_image, "https://img.example/dune.jpg");
        assert_eq!(book.book_uri, "https://books.example/volumes/abc");
        assert_eq!(book.rank, 0);
    }

    #[test]
    fn test_multiple_authors_joined() {
        let mut volume = sample_volume();
        volume.volume_info.authors = vec!["Terry Pratchett".into(), "Neil Gaiman".into()];
        let volumes = VolumesResponse {
            total_items: 1,
            items: vec![volume],
        };

        let feed = feed_from_search(&volumes);
        assert_eq!(
            feed.results.lists[0].books[0].author,
            "Terry Pratchett, Neil Gaiman"
        );
    }

    #[test]
    fn test_missing_authors_fall_back_to_unknown() {
        let mut volume = sample_volume();
        volume.volume_info.authors.clear();
        volume.volume_info.image_links = None;
        let volumes = VolumesResponse {
            total_items: 1,
            items: vec![volume],
        };

        let feed = feed_from_search(&volumes);
        let book = &feed.results.lists[0].books[0];
        assert_eq!(book.author, "Unknown Author");
        assert_eq!(book.book_image, "");
    }

    #[test]
    fn test_empty_response_yields_empty_book_list() {
        let feed = feed_from_search(&VolumesResponse::default());
        assert_eq!(feed.num_results, 0);
        assert!(feed.results.lists[0].books.is_empty());
    }
}
