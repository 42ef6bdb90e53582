//! Admin handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;
use readup_common::{
    auth::AuthContext,
    db::Repository,
    errors::{AppError, Result},
};

#[derive(Serialize)]
pub struct ResetResponse {
    pub status: String,
}

/// Wipe all reviews, upvotes, lists and list items.
///
/// Restricted to the configured admin user; unconfigured deployments have
/// no admin and always refuse.
pub async fn reset(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<(StatusCode, Json<ResetResponse>)> {
    let is_admin = state
        .config
        .admin
        .user_id
        .as_deref()
        .is_some_and(|admin_id| admin_id == auth.user_id);
    if !is_admin {
        return Err(AppError::Forbidden {
            message: "Admin access required".to_string(),
        });
    }

    let repo = Repository::new(state.db.clone());
    repo.reset_content().await?;

    tracing::warn!(user_id = %auth.user_id, "All application content reset");

    Ok((
        StatusCode::OK,
        Json(ResetResponse {
            status: "reset".to_string(),
        }),
    ))
}
