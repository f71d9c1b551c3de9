//! Authentication middleware and extractors.
//!
//! The session holds the raw bearer token from the auth backend. A token
//! counts as a login only while it decodes and its `exp` lies in the future;
//! there is no refresh.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use doux_core::AuthToken;
use tower_sessions::Session;

use crate::models::session_keys;

/// Extractor that requires a valid, unexpired token.
///
/// If the visitor is not logged in, returns a redirect to the login page.
/// An expired or malformed token found in the session is removed.
///
/// # Example
///
/// ```rust,ignore
/// async fn checkout(RequireAuth(token): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", token.email().unwrap_or("customer"))
/// }
/// ```
pub struct RequireAuth(pub AuthToken);

/// Error returned when authentication is required but the visitor is not logged in.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Redirect to login page, telling the visitor their session ran out.
    SessionExpired,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::SessionExpired => Redirect::to("/auth/login?error=expired").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Token state of a session.
enum TokenState {
    Missing,
    Invalid,
    Valid(AuthToken),
}

async fn token_state(session: &Session) -> TokenState {
    let raw: Option<String> = session.get(session_keys::TOKEN).await.ok().flatten();
    let Some(raw) = raw else {
        return TokenState::Missing;
    };
    match AuthToken::parse(&raw) {
        Ok(token) if !token.is_expired(Utc::now()) => TokenState::Valid(token),
        _ => TokenState::Invalid,
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        match token_state(session).await {
            TokenState::Valid(token) => Ok(Self(token)),
            _ if is_api => Err(AuthRejection::Unauthorized),
            TokenState::Missing => Err(AuthRejection::RedirectToLogin),
            TokenState::Invalid => {
                if let Err(e) = clear_auth_token(session).await {
                    tracing::warn!(error = %e, "Failed to drop expired token");
                }
                Err(AuthRejection::SessionExpired)
            }
        }
    }
}

/// Extractor that optionally gets the current token.
///
/// Unlike `RequireAuth`, this does not reject the request and leaves the
/// session untouched; expired tokens simply read as logged out.
pub struct OptionalAuth(pub Option<AuthToken>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => match token_state(session).await {
                TokenState::Valid(token) => Some(token),
                TokenState::Missing | TokenState::Invalid => None,
            },
            None => None,
        };

        Ok(Self(token))
    }
}

/// Store a freshly issued token (login).
///
/// The session id is cycled to prevent session fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_token(
    session: &Session,
    token: &AuthToken,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::TOKEN, token.expose()).await
}

/// Drop the token from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(session_keys::TOKEN).await?;
    Ok(())
}
