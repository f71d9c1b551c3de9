//! Google sign-in route handlers.
//!
//! Two entry points feed the same backend exchange:
//! - `GET /auth/google/callback`: OAuth redirect with `?code=` or `?id_token=`
//! - `POST /auth/google/callback`: Google Identity Services credential, posted
//!   by the sign-in button (via HTMX from the popup callback, or as a plain
//!   form in redirect mode)
//!
//! The backend verifies the credential and issues its own token, which is
//! stored exactly like a password login.

use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::GoogleCredential;
use crate::error::{AppError, set_sentry_user};
use crate::middleware::set_auth_token;
use crate::routes::auth::report;
use crate::routes::{hx_redirect, is_htmx};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Cookie Google sets for the double-submit check in redirect mode.
const GOOGLE_CSRF_COOKIE: &str = "g_csrf_token";

/// Query parameters from the Google OAuth redirect.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    /// Authorization code to exchange on the backend.
    pub code: Option<String>,
    /// ID token (implicit flow).
    pub id_token: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
}

impl CallbackQuery {
    fn credential(self) -> Option<GoogleCredential> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        present(self.id_token)
            .map(GoogleCredential::IdToken)
            .or_else(|| present(self.code).map(GoogleCredential::Code))
    }
}

/// Credential posted by Google Identity Services.
#[derive(Deserialize)]
pub struct CredentialForm {
    pub credential: String,
    /// Present in redirect mode; must equal the `g_csrf_token` cookie.
    pub g_csrf_token: Option<String>,
}

/// Double-submit check for a posted credential.
///
/// Redirect-mode posts must carry `g_csrf_token` matching the cookie of the
/// same name. Popup-mode posts come through HTMX, which a cross-site form
/// cannot imitate.
fn passes_csrf_check(headers: &HeaderMap, jar: &CookieJar, posted: Option<&str>) -> bool {
    match posted {
        Some(posted) => jar
            .get(GOOGLE_CSRF_COOKIE)
            .is_some_and(|cookie| cookie.value() == posted),
        None => is_htmx(headers),
    }
}

/// Navigate after the exchange, the HTMX way when the request came from HTMX.
fn navigate(headers: &HeaderMap, location: &str) -> Response {
    if is_htmx(headers) {
        hx_redirect(location.to_string())
    } else {
        Redirect::to(location).into_response()
    }
}

/// Exchange `credential` with the backend and store the resulting token.
async fn sign_in(
    state: &AppState,
    session: &Session,
    credential: &GoogleCredential,
) -> Result<(), AppError> {
    let token = AuthService::new(state.backend()).google(credential).await?;
    set_auth_token(session, &token).await?;
    set_sentry_user(token.email());
    Ok(())
}

fn finish(headers: &HeaderMap, result: Result<(), AppError>) -> Response {
    let code = match result {
        Ok(()) => return navigate(headers, "/"),
        Err(AppError::Auth(e)) => {
            report(&e, "Google sign-in failed");
            match e {
                AuthError::Backend(_) => "unavailable",
                _ => "google",
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Google sign-in failed");
            "unavailable"
        }
    };
    navigate(headers, &format!("/auth/login?error={code}"))
}

/// Handle the OAuth redirect.
///
/// # Route
///
/// `GET /auth/google/callback`
#[instrument(skip(state, session, headers, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = &query.error {
        tracing::warn!(%error, "Google authorization refused");
        return Redirect::to("/auth/login?error=google").into_response();
    }

    let Some(credential) = query.credential() else {
        tracing::warn!("Google callback without code or id_token");
        return Redirect::to("/auth/login?error=google").into_response();
    };

    let result = sign_in(&state, &session, &credential).await;
    finish(&headers, result)
}

/// Handle a Google Identity Services credential.
///
/// # Route
///
/// `POST /auth/google/callback`
#[instrument(skip(state, session, headers, jar, form))]
pub async fn credential(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<CredentialForm>,
) -> Response {
    if !passes_csrf_check(&headers, &jar, form.g_csrf_token.as_deref()) {
        tracing::warn!("Google credential failed the double-submit check");
        return navigate(&headers, "/auth/login?error=google");
    }

    if form.credential.trim().is_empty() {
        return navigate(&headers, "/auth/login?error=google");
    }

    let result = sign_in(&state, &session, &GoogleCredential::IdToken(form.credential)).await;
    finish(&headers, result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_prefers_id_token() {
        let query = CallbackQuery {
            code: Some("abc".into()),
            id_token: Some("jwt".into()),
            error: None,
        };
        assert_eq!(query.credential(), Some(GoogleCredential::IdToken("jwt".into())));

        let query = CallbackQuery {
            code: Some("abc".into()),
            id_token: Some("  ".into()),
            error: None,
        };
        assert_eq!(query.credential(), Some(GoogleCredential::Code("abc".into())));

        assert_eq!(CallbackQuery::default().credential(), None);
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_csrf_token_must_match_cookie() {
        let request = headers(&[("cookie", "doux_session=x; g_csrf_token=abc123")]);
        let jar = CookieJar::from_headers(&request);
        assert!(passes_csrf_check(&request, &jar, Some("abc123")));
        assert!(!passes_csrf_check(&request, &jar, Some("forged")));

        let no_cookie = headers(&[]);
        let jar = CookieJar::from_headers(&no_cookie);
        assert!(!passes_csrf_check(&no_cookie, &jar, Some("abc123")));
    }

    #[test]
    fn test_missing_csrf_token_requires_htmx() {
        let plain = headers(&[]);
        let jar = CookieJar::from_headers(&plain);
        assert!(!passes_csrf_check(&plain, &jar, None));

        let htmx = headers(&[("hx-request", "true")]);
        let jar = CookieJar::from_headers(&htmx);
        assert!(passes_csrf_check(&htmx, &jar, None));
    }
}
