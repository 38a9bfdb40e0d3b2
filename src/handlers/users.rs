use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    error::{AppError, Result},
    models::user::PublicUser,
    repositories::users as user_repo,
    services::token::AccessClaims,
    state::AppState,
};

/// Returns the authenticated user's own profile.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(PublicUser::from(&user)))
}

/// Returns a user's public profile by username.
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(PublicUser::from(&user)))
}
