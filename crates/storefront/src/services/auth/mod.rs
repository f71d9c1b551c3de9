//! Authentication service.
//!
//! Password login, registration and Google sign-in, all delegated to the
//! auth backend. Tokens the backend issues are decoded before they are
//! accepted so an unusable token never reaches the session.

mod error;

pub use error::AuthError;

use chrono::Utc;
use doux_core::{AuthToken, Email, NewUser};
use secrecy::SecretString;
use tracing::info;

use crate::backend::{ApiError, BackendClient, GoogleCredential};

/// Authentication service.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the backend refuses the login.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthToken, AuthError> {
        let email = Email::parse(email)?;

        let raw = self
            .backend
            .login(email.as_str(), password)
            .await
            .map_err(|e| {
                if e.is_rejection() {
                    AuthError::InvalidCredentials
                } else {
                    AuthError::Backend(e)
                }
            })?;

        let token = accept_token(&raw)?;
        info!(email = %email, "Login succeeded");
        Ok(token)
    }

    /// Create an account from a finished wizard draft.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` with the backend's message if the
    /// account is refused.
    pub async fn register(&self, user: &NewUser) -> Result<(), AuthError> {
        self.backend
            .register(user)
            .await
            .map_err(|e| rejected_or_backend(e, "Registration failed"))?;
        info!(email = %user.email, "Account created");
        Ok(())
    }

    // =========================================================================
    // Google Sign-In
    // =========================================================================

    /// Exchange a Google ID token or authorization code for a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` if the backend refuses the credential.
    pub async fn google(&self, credential: &GoogleCredential) -> Result<AuthToken, AuthError> {
        let raw = self
            .backend
            .google(credential)
            .await
            .map_err(|e| rejected_or_backend(e, "Google sign-in failed"))?;

        let token = accept_token(&raw)?;
        info!(email = token.email().unwrap_or_default(), "Google sign-in succeeded");
        Ok(token)
    }
}

fn rejected_or_backend(error: ApiError, fallback: &str) -> AuthError {
    if error.is_rejection() {
        let message = error.backend_message().unwrap_or(fallback).to_string();
        AuthError::Rejected(message)
    } else {
        AuthError::Backend(error)
    }
}

/// Decode a freshly issued token and refuse it if it is already expired.
fn accept_token(raw: &str) -> Result<AuthToken, AuthError> {
    let token = AuthToken::parse(raw)?;
    if token.is_expired(Utc::now()) {
        return Err(AuthError::ExpiredToken);
    }
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doux_core::AuthTokenError;

    use super::*;

    fn jwt(payload: &str) -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2ln",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_accept_token() {
        let future = Utc::now().timestamp() + 3600;
        let token = accept_token(&jwt(&format!(r#"{{"exp":{future}}}"#))).unwrap();
        assert!(!token.is_expired(Utc::now()));

        let past = Utc::now().timestamp() - 3600;
        assert!(matches!(
            accept_token(&jwt(&format!(r#"{{"exp":{past}}}"#))),
            Err(AuthError::ExpiredToken)
        ));
        assert!(matches!(
            accept_token("not-a-jwt"),
            Err(AuthError::Token(AuthTokenError::Segments))
        ));
    }

    #[test]
    fn test_rejection_keeps_backend_message() {
        let err = rejected_or_backend(
            ApiError::Status {
                status: 409,
                message: "Email already exists".into(),
            },
            "Registration failed",
        );
        assert_eq!(err.user_message(), "Email already exists");
        assert_eq!(err.code(), "rejected");

        let err = rejected_or_backend(
            ApiError::Status {
                status: 400,
                message: String::new(),
            },
            "Registration failed",
        );
        assert_eq!(err.user_message(), "Registration failed");

        let err = rejected_or_backend(
            ApiError::Status {
                status: 502,
                message: "bad gateway".into(),
            },
            "Registration failed",
        );
        assert_eq!(err.code(), "unavailable");
        assert!(err.is_server_error());
    }
}
