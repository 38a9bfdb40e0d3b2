use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::extract_bearer_token,
    models::user::PublicUser,
    repositories::users as user_repo,
    services::password,
    state::AppState,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug, Validate)]
pub struct RegisterRequest {
    #[garde(length(chars, min = 3, max = 30), custom(valid_username_chars))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

/// The request payload for a token refresh.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The response payload for message-only outcomes.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn valid_username_chars(value: &str, _context: &()) -> garde::Result {
    if value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(garde::Error::new(
            "can only contain letters, numbers, underscores, and hyphens",
        ))
    }
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("Register attempt for username: {}", payload.username);

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = user_repo::create_user(
        &state.db,
        &payload.username,
        &payload.email,
        &password_hash,
    )
    .await?;

    tracing::info!("User registered: {}", user.id);

    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

/// Handles user login. Returns a fresh token pair with the public user
/// projection.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let pair = state
        .sessions
        .login(&payload.identifier, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(pair)).into_response())
}

/// Handles a token refresh. Returns a brand-new token pair.
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Response> {
    let pair = state.sessions.refresh(&payload.refresh_token).await?;

    Ok((StatusCode::OK, Json(pair)).into_response())
}

/// Handles user logout by revoking the presented access token.
///
/// Deliberately not routed behind `require_auth`: a second logout with the
/// same (now-revoked) token must still succeed, and the gate would reject
/// it with 401 before this handler ran.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, request: Request<Body>) -> Result<Response> {
    let token = extract_bearer_token(&request)
        .ok_or(AppError::Unauthorized)?
        .to_string();

    state.sessions.logout(&token).await?;

    let response = MessageResponse {
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_response_carries_only_a_message() {
        let response = MessageResponse {
            message: "Logout successful".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, serde_json::json!({ "message": "Logout successful" }));
    }
}
