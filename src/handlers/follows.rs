use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    error::{AppError, Result},
    handlers::auth::MessageResponse,
    repositories::{follows as follow_repo, users as user_repo},
    services::token::AccessClaims,
    state::AppState,
};

/// Makes the authenticated user follow `username`.
#[axum::debug_handler]
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let target = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    if target.id == claims.sub {
        return Err(AppError::Validation(
            "Cannot follow yourself".to_string(),
        ));
    }

    follow_repo::follow(&state.db, claims.sub, target.id).await?;
    tracing::info!("User {} now follows user {}", claims.sub, target.id);

    let response = MessageResponse {
        message: format!("Now following {}", target.username),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Makes the authenticated user unfollow `username`.
#[axum::debug_handler]
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let target = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    let removed = follow_repo::unfollow(&state.db, claims.sub, target.id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }

    tracing::info!("User {} unfollowed user {}", claims.sub, target.id);

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the users following `username`.
#[axum::debug_handler]
pub async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    let users = follow_repo::followers(&state.db, user.id).await?;
    Ok(Json(users))
}

/// Lists the users that `username` follows.
#[axum::debug_handler]
pub async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    let users = follow_repo::following(&state.db, user.id).await?;
    Ok(Json(users))
}
