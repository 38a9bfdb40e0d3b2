use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::{AppError, Result},
    handlers::auth::MessageResponse,
    repositories::{tweets as tweet_repo, users as user_repo},
    state::AppState,
};

/// Deactivates a user account. The user's refresh tokens stop working at
/// the next refresh; outstanding access tokens run out on their own.
#[axum::debug_handler]
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let deactivated = user_repo::deactivate(&state.db, user_id).await?;
    if !deactivated {
        return Err(AppError::NotFound);
    }

    tracing::info!("User {} deactivated by an administrator", user_id);

    let response = MessageResponse {
        message: format!("User {} deactivated", user_id),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Removes any tweet, regardless of author.
#[axum::debug_handler]
pub async fn delete_any_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let removed = tweet_repo::delete(&state.db, tweet_id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }

    tracing::info!("Tweet {} removed by an administrator", tweet_id);

    Ok(StatusCode::NO_CONTENT)
}
