use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, Result},
    models::user::Role,
    repositories::revoked_tokens::RevocationLedger,
    repositories::users::CredentialStore,
    services::session::SessionService,
    services::token::AccessClaims,
};

/// Extracts the bearer token from the Authorization header.
///
/// Any other scheme, or a missing header, yields `None`.
pub fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// A middleware that requires a verified, non-revoked access token.
///
/// On success the decoded claims are attached to the request's extensions
/// for downstream handlers.
pub async fn require_auth<C, L>(
    State(sessions): State<SessionService<C, L>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response>
where
    C: CredentialStore + Clone + Send + Sync + 'static,
    L: RevocationLedger + Clone + Send + Sync + 'static,
{
    let token = extract_bearer_token(&request).ok_or(AppError::Unauthorized)?;

    let claims = sessions.authenticate(token).await?;
    tracing::debug!("Request authenticated for user: {}", claims.sub);

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// A middleware that requires the administrator role.
///
/// Layered behind `require_auth`, so the claims are already attached; a
/// non-admin role is a forbidden outcome, not an unauthorized one.
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response> {
    let claims = request
        .extensions()
        .get::<AccessClaims>()
        .ok_or(AppError::Unauthorized)?;

    if claims.role != Role::Admin {
        tracing::warn!("User {} denied admin access", claims.sub);
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
