//! Middleware enforcing HTTP Basic authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use tracing::{error, warn};

use super::AuthError;
use crate::{error::ApiError, state::AppState};

/// Verify Basic credentials before the request reaches a handler
///
/// On success the [`Principal`](super::Principal) is stored in the request
/// extensions. Only usernames the provider knows are tracked by the login
/// guard.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Authorization(credentials) = req
        .headers()
        .typed_get::<Authorization<Basic>>()
        .ok_or(ApiError::Unauthorized)?;

    let username = credentials.username();

    let attempt = if state.auth_provider.is_known(username) {
        match state.login_guard.begin_attempt(username) {
            Some(attempt) => Some(attempt),
            None => {
                warn!("Rejected request for locked username {}", username);
                return Err(ApiError::Unauthorized);
            }
        }
    } else {
        None
    };

    let principal = match state
        .auth_provider
        .verify(username, credentials.password())
        .await
    {
        Ok(principal) => principal,
        Err(AuthError::InvalidCredentials) => {
            warn!("Invalid credentials for username {}", username);
            if let Some(attempt) = attempt {
                attempt.failed();
            }
            return Err(ApiError::Unauthorized);
        }
        Err(e) => {
            error!("Failed to verify credentials: {}", e);
            return Err(ApiError::InternalServerError);
        }
    };

    if let Some(attempt) = attempt {
        attempt.succeeded();
    }

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
