//! Book catalog handlers

use axum::{
    extract::{Query, State},
    Json,
};

use crate::AppState;
use readup_common::{
    cache::FEED_KEY,
    catalog::{SearchFeed, SearchParams},
    errors::Result,
};

/// Current bestseller overview feed, cached for the configured TTL
pub async fn feed(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let catalog = state.catalog.clone();
    let feed = state
        .feed_cache
        .get_or_load(FEED_KEY, || async move {
            catalog.fetch_bestsellers_overview().await
        })
        .await?;
    Ok(Json(feed))
}

/// Volume search by author, title and/or ISBN, in the feed shape
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchFeed>> {
    let feed = state.catalog.search_volumes(&params).await?;
    Ok(Json(feed))
}
