use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    repositories::{tweets as tweet_repo, users as user_repo},
    services::token::AccessClaims,
    state::AppState,
};

/// The maximum page size for tweet listings.
const MAX_PAGE_SIZE: i64 = 200;

/// The request payload for creating a tweet.
#[derive(Deserialize, Debug, Validate)]
pub struct CreateTweetRequest {
    #[garde(length(chars, min = 1, max = 280))]
    pub content: String,
}

/// Pagination parameters for tweet listings.
#[derive(Deserialize, Debug)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Pagination {
    fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}

/// Creates a tweet authored by the authenticated user.
#[axum::debug_handler]
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<CreateTweetRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tweet = tweet_repo::create_tweet(&state.db, claims.sub, &payload.content).await?;
    tracing::info!("Tweet {} created by user {}", tweet.id, claims.sub);

    Ok((StatusCode::CREATED, Json(tweet)))
}

/// Returns a single tweet by ID.
#[axum::debug_handler]
pub async fn get_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let tweet = tweet_repo::find_by_id(&state.db, tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(tweet))
}

/// Lists a user's tweets, newest first.
#[axum::debug_handler]
pub async fn list_user_tweets(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    let (limit, offset) = pagination.clamped();
    let tweets = tweet_repo::list_by_user(&state.db, user.id, limit, offset).await?;

    Ok(Json(tweets))
}

/// Lists the authenticated user's timeline: their own tweets plus tweets
/// from everyone they follow, newest first.
#[axum::debug_handler]
pub async fn timeline(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse> {
    let (limit, offset) = pagination.clamped();
    let tweets = tweet_repo::timeline(&state.db, claims.sub, limit, offset).await?;

    Ok(Json(tweets))
}

/// Deletes a tweet. Only the author may delete their own tweet.
#[axum::debug_handler]
pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(tweet_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let tweet = tweet_repo::find_by_id(&state.db, tweet_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if tweet.user_id != claims.sub {
        return Err(AppError::Forbidden);
    }

    tweet_repo::delete(&state.db, tweet_id).await?;
    tracing::info!("Tweet {} deleted by user {}", tweet_id, claims.sub);

    Ok(StatusCode::NO_CONTENT)
}
