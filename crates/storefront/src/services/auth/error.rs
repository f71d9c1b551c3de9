//! Authentication error types.

use doux_core::{AuthTokenError, EmailError, RegistrationError};
use thiserror::Error;

use crate::backend::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend refused the email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend refused the request with a message for the user.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The wizard draft failed validation.
    #[error("registration incomplete: {0}")]
    Registration(#[from] RegistrationError),

    /// The backend issued a token that cannot be decoded.
    #[error("unusable token: {0}")]
    Token(#[from] AuthTokenError),

    /// The backend issued a token that is already expired.
    #[error("token already expired")]
    ExpiredToken,

    /// The backend could not be reached or failed.
    #[error("backend error: {0}")]
    Backend(#[source] ApiError),
}

impl AuthError {
    /// Short code carried in `?error=` on the login page.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "email",
            Self::InvalidCredentials => "credentials",
            Self::Rejected(_) => "rejected",
            Self::Registration(_) => "registration",
            Self::Token(_) | Self::ExpiredToken => "token",
            Self::Backend(_) => "unavailable",
        }
    }

    /// Message safe to show the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(e) => format!("Invalid email address: {e}"),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Registration(e) => e.to_string(),
            Self::Token(_) | Self::ExpiredToken => {
                "Sign-in failed, please try again".to_string()
            }
            Self::Backend(_) => {
                "The sign-in service is unavailable, please try again later".to_string()
            }
        }
    }

    /// Whether this should be reported as a server-side failure.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Token(_) | Self::ExpiredToken | Self::Backend(_))
    }
}
