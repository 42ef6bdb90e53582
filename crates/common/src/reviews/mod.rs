//! Review service
//!
//! Create/read/update/delete star-rated reviews, plus the toggle-upvote
//! state machine. Every returned review is enriched with the author's
//! display profile from the identity provider; a failed lookup degrades
//! that one review to the Anonymous placeholder and never fails the
//! operation.

use crate::db::{ContentStore, UpvoteOutcome};
use crate::errors::{AppError, Result};
use crate::identity::{profile_or_anonymous, IdentityProvider};
use crate::metrics;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::Review;

/// Input for creating a review; presence is validated by the service
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreateReviewInput {
    pub book_isbn: Option<String>,
    pub review_text: Option<String>,
    pub stars: Option<i32>,
}

/// Partial update to a review; at least one field must be present
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateReviewInput {
    pub stars: Option<i32>,
    pub review_text: Option<String>,
}

/// A stored review carrying the author's display profile
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedReview {
    #[serde(flatten)]
    pub review: Review,
    pub nickname: String,
    pub profile_image_url: String,
}

/// Validate a star rating
pub fn validate_stars(stars: i32) -> Result<()> {
    if (1..=5).contains(&stars) {
        Ok(())
    } else {
        Err(AppError::Validation {
            message: "stars must be between 1 and 5".to_string(),
            field: Some("stars".to_string()),
        })
    }
}

/// Validate a create request, returning the concrete fields
pub fn validate_create(input: &CreateReviewInput) -> Result<(String, String, i32)> {
    let book_isbn = require_text(&input.book_isbn, "book_isbn")?;
    let review_text = require_text(&input.review_text, "review_text")?;
    let stars = input.stars.ok_or_else(|| AppError::MissingField {
        field: "stars".to_string(),
    })?;
    validate_stars(stars)?;

    Ok((book_isbn, review_text, stars))
}

/// Validate a partial update: at least one field, stars in range, text
/// non-empty when provided
pub fn validate_update(input: &UpdateReviewInput) -> Result<()> {
    if input.stars.is_none() && input.review_text.is_none() {
        return Err(AppError::Validation {
            message: "At least one of stars or review_text is required".to_string(),
            field: None,
        });
    }
    if let Some(stars) = input.stars {
        validate_stars(stars)?;
    }
    if let Some(ref text) = input.review_text {
        if text.trim().is_empty() {
            return Err(AppError::Validation {
                message: "review_text cannot be empty".to_string(),
                field: Some("review_text".to_string()),
            });
        }
    }
    Ok(())
}

fn require_text(value: &Option<String>, field: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::MissingField {
            field: field.to_string(),
        })
}

/// Review operations over the content store and identity provider
#[derive(Clone)]
pub struct ReviewService {
    repo: Arc<dyn ContentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn ContentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { repo, identity }
    }

    /// Create a review; returns the enriched record
    pub async fn create_review(
        &self,
        author_id: &str,
        input: &CreateReviewInput,
    ) -> Result<EnrichedReview> {
        let (book_isbn, review_text, stars) = validate_create(input)?;

        let review = self
            .repo
            .insert_review(author_id, book_isbn, review_text, stars)
            .await?;

        metrics::record_review_created();
        tracing::info!(
            review_id = %review.review_id,
            user_id = %author_id,
            book_isbn = %review.book_isbn,
            stars = review.stars,
            "Review created"
        );

        Ok(self.enrich(review).await)
    }

    /// Reviews for a book, most-upvoted then most-recent first
    pub async fn reviews_for_book(&self, book_isbn: &str) -> Result<Vec<EnrichedReview>> {
        let reviews = self.repo.reviews_for_book(book_isbn).await?;
        Ok(self.enrich_all(reviews).await)
    }

    /// Reviews by a user, most-recent first
    pub async fn reviews_for_user(&self, user_id: &str) -> Result<Vec<EnrichedReview>> {
        let reviews = self.repo.reviews_for_user(user_id).await?;
        Ok(self.enrich_all(reviews).await)
    }

    /// Fetch a single review
    pub async fn get_review(&self, review_id: Uuid) -> Result<EnrichedReview> {
        let review = self
            .repo
            .find_review(review_id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        Ok(self.enrich(review).await)
    }

    /// Update a review's stars and/or text; author-only
    pub async fn update_review(
        &self,
        review_id: Uuid,
        requester_id: &str,
        input: &UpdateReviewInput,
    ) -> Result<EnrichedReview> {
        validate_update(input)?;

        let review = self
            .repo
            .find_review(review_id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        if review.user_id != requester_id {
            return Err(AppError::Forbidden {
                message: "Only the author can edit this review".to_string(),
            });
        }

        let updated = self
            .repo
            .update_review(review_id, input.stars, input.review_text.clone())
            .await?;

        tracing::info!(
            review_id = %review_id,
            user_id = %requester_id,
            "Review updated"
        );

        Ok(self.enrich(updated).await)
    }

    /// Delete a review and its upvote rows; author-only
    pub async fn delete_review(&self, review_id: Uuid, requester_id: &str) -> Result<()> {
        let review = self
            .repo
            .find_review(review_id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        if review.user_id != requester_id {
            return Err(AppError::Forbidden {
                message: "Only the author can delete this review".to_string(),
            });
        }

        self.repo.delete_review_cascading(review_id).await?;

        tracing::info!(
            review_id = %review_id,
            user_id = %requester_id,
            "Review deleted"
        );

        Ok(())
    }

    /// Toggle the requester's upvote on a review.
    ///
    /// The returned counter is authoritative; the caller must not infer the
    /// new state from its own prior request state.
    pub async fn toggle_upvote(&self, review_id: Uuid, user_id: &str) -> Result<UpvoteOutcome> {
        let outcome = self.repo.toggle_upvote(review_id, user_id).await?;

        let direction = match outcome.action {
            crate::db::UpvoteAction::Added => "added",
            crate::db::UpvoteAction::Removed => "removed",
        };
        metrics::record_upvote_toggle(direction);
        tracing::info!(
            review_id = %review_id,
            user_id = %user_id,
            action = direction,
            upvotes = outcome.upvotes,
            "Upvote toggled"
        );

        Ok(outcome)
    }

    async fn enrich(&self, review: Review) -> EnrichedReview {
        let profile = profile_or_anonymous(self.identity.as_ref(), &review.user_id).await;
        EnrichedReview {
            review,
            nickname: profile.nickname,
            profile_image_url: profile.profile_image_url,
        }
    }

    /// Enrich reviews with parallel, independently-failing profile lookups
    async fn enrich_all(&self, reviews: Vec<Review>) -> Vec<EnrichedReview> {
        join_all(reviews.into_iter().map(|review| self.enrich(review))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::identity::MockIdentity;
    use crate::ANONYMOUS_NICKNAME;

    fn service() -> ReviewService {
        ReviewService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(
                MockIdentity::new()
                    .with_profile("u1", "bookworm", "a.jpg")
                    .with_profile("u2", "pageturner", "b.jpg"),
            ),
        )
    }

    fn full_input() -> CreateReviewInput {
        CreateReviewInput {
            book_isbn: Some("9780000000001".into()),
            review_text: Some("Great book".into()),
            stars: Some(5),
        }
    }

    #[test]
    fn test_create_accepts_full_input() {
        let (isbn, text, stars) = validate_create(&full_input()).unwrap();
        assert_eq!(isbn, "9780000000001");
        assert_eq!(text, "Great book");
        assert_eq!(stars, 5);
    }

    #[test]
    fn test_create_rejects_missing_fields() {
        for missing in ["book_isbn", "review_text", "stars"] {
            let mut input = full_input();
            match missing {
                "book_isbn" => input.book_isbn = None,
                "review_text" => input.review_text = None,
                _ => input.stars = None,
            }
            let err = validate_create(&input).unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_stars_bounds() {
        assert!(validate_stars(1).is_ok());
        assert!(validate_stars(5).is_ok());
        assert!(validate_stars(0).is_err());
        assert!(validate_stars(6).is_err());
        assert!(validate_stars(-1).is_err());
    }

    #[test]
    fn test_create_rejects_out_of_range_stars() {
        let mut input = full_input();
        input.stars = Some(6);
        assert!(validate_create(&input).is_err());
    }

    #[test]
    fn test_create_rejects_blank_text() {
        let mut input = full_input();
        input.review_text = Some("   ".into());
        assert!(validate_create(&input).is_err());
    }

    #[test]
    fn test_update_requires_at_least_one_field() {
        assert!(validate_update(&UpdateReviewInput::default()).is_err());
    }

    #[test]
    fn test_update_with_only_stars() {
        let input = UpdateReviewInput {
            stars: Some(3),
            review_text: None,
        };
        assert!(validate_update(&input).is_ok());
    }

    #[test]
    fn test_update_with_only_text() {
        let input = UpdateReviewInput {
            stars: None,
            review_text: Some("Changed my mind".into()),
        };
        assert!(validate_update(&input).is_ok());
    }

    #[test]
    fn test_update_rejects_blank_text() {
        let input = UpdateReviewInput {
            stars: None,
            review_text: Some("  ".into()),
        };
        assert!(validate_update(&input).is_err());
    }

    #[test]
    fn test_update_rejects_out_of_range_stars() {
        let input = UpdateReviewInput {
            stars: Some(0),
            review_text: None,
        };
        assert!(validate_update(&input).is_err());
    }

    #[tokio::test]
    async fn test_created_review_starts_with_zero_upvotes() {
        let svc = service();
        let review = svc.create_review("u1", &full_input()).await.unwrap();
        assert_eq!(review.review.upvotes, 0);
        assert_eq!(review.review.stars, 5);
        assert_eq!(review.nickname, "bookworm");
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_count() {
        let svc = service();
        let review = svc.create_review("u1", &full_input()).await.unwrap();
        let review_id = review.review.review_id;

        let first = svc.toggle_upvote(review_id, "u2").await.unwrap();
        assert_eq!(first.upvotes, 1);
        assert_eq!(first.action, crate::db::UpvoteAction::Added);

        let second = svc.toggle_upvote(review_id, "u2").await.unwrap();
        assert_eq!(second.upvotes, 0);
        assert_eq!(second.action, crate::db::UpvoteAction::Removed);

        let stored = svc.get_review(review_id).await.unwrap();
        assert_eq!(stored.review.upvotes, 0);
    }

    #[tokio::test]
    async fn test_toggle_on_missing_review_not_found() {
        let svc = service();
        let err = svc.toggle_upvote(Uuid::new_v4(), "u2").await.unwrap_err();
        assert!(matches!(err, AppError::ReviewNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_non_author_forbidden_and_review_kept() {
        let svc = service();
        let review = svc.create_review("u1", &full_input()).await.unwrap();
        let review_id = review.review.review_id;

        let err = svc.delete_review(review_id, "u2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
        assert!(svc.get_review(review_id).await.is_ok());

        svc.delete_review(review_id, "u1").await.unwrap();
        assert!(svc.get_review(review_id).await.is_err());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let svc = service();
        let review = svc.create_review("u1", &full_input()).await.unwrap();
        let review_id = review.review.review_id;

        let input = UpdateReviewInput {
            stars: Some(3),
            review_text: None,
        };
        let updated = svc.update_review(review_id, "u1", &input).await.unwrap();
        assert_eq!(updated.review.stars, 3);
        assert_eq!(updated.review.review_text, "Great book");
        assert!(updated.review.date_modified >= review.review.date_modified);

        let err = svc.update_review(review_id, "u2", &input).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_reviews_for_book_ordered_by_upvotes() {
        let svc = service();
        let first = svc.create_review("u1", &full_input()).await.unwrap();
        let second = svc.create_review("u2", &full_input()).await.unwrap();

        svc.toggle_upvote(second.review.review_id, "u1")
            .await
            .unwrap();

        let reviews = svc.reviews_for_book("9780000000001").await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].review.review_id, second.review.review_id);
        assert_eq!(reviews[1].review.review_id, first.review.review_id);
    }

    #[tokio::test]
    async fn test_enrichment_degrades_to_anonymous() {
        let svc = ReviewService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MockIdentity::failing()),
        );
        let review = svc.create_review("u1", &full_input()).await.unwrap();
        assert_eq!(review.nickname, ANONYMOUS_NICKNAME);
        assert_eq!(review.profile_image_url, "");
    }
}
