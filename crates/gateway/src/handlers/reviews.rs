//! Review handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::AppState;
use readup_common::{
    auth::AuthContext,
    db::UpvoteOutcome,
    errors::Result,
    reviews::{CreateReviewInput, EnrichedReview, UpdateReviewInput},
};

/// Create a new review for a book
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<CreateReviewInput>,
) -> Result<(StatusCode, Json<EnrichedReview>)> {
    let review = state.reviews.create_review(&auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// All reviews for a book, most-upvoted then most-recent first
pub async fn reviews_for_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<Vec<EnrichedReview>>> {
    let reviews = state.reviews.reviews_for_book(&isbn).await?;
    Ok(Json(reviews))
}

/// All reviews written by a user, most-recent first
pub async fn reviews_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EnrichedReview>>> {
    let reviews = state.reviews.reviews_for_user(&user_id).await?;
    Ok(Json(reviews))
}

/// Get a single review by id
pub async fn get_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<EnrichedReview>> {
    let review = state.reviews.get_review(review_id).await?;
    Ok(Json(review))
}

/// Update a review's stars and/or text (author only)
pub async fn update_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
    Json(input): Json<UpdateReviewInput>,
) -> Result<Json<EnrichedReview>> {
    let review = state
        .reviews
        .update_review(review_id, &auth.user_id, &input)
        .await?;
    Ok(Json(review))
}

/// Delete a review (author only)
pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .reviews
        .delete_review(review_id, &auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the requester's upvote on a review
pub async fn toggle_upvote(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
) -> Result<Json<UpvoteOutcome>> {
    let outcome = state
        .reviews
        .toggle_upvote(review_id, &auth.user_id)
        .await?;
    Ok(Json(outcome))
}
