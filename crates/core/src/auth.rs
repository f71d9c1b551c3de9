//! Bearer token decoding and the logged-in gate.
//!
//! Tokens are JWTs issued by the auth backend. Only the payload is read here,
//! to find the `exp` claim; the signature belongs to the backend and is not
//! verified.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Errors from [`AuthToken::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthTokenError {
    #[error("token is empty")]
    Empty,
    #[error("token does not have three segments")]
    Segments,
    #[error("token payload is not valid base64")]
    Encoding,
    #[error("token payload is not valid JSON: {0}")]
    Payload(String),
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    email: Option<String>,
}

/// A decoded bearer token.
///
/// The raw token is kept as a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct AuthToken {
    raw: SecretString,
    exp: Option<i64>,
    email: Option<String>,
}

impl AuthToken {
    /// Decode the payload segment of a JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not three dot-separated segments or
    /// the payload is not base64-encoded JSON.
    pub fn parse(raw: &str) -> Result<Self, AuthTokenError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AuthTokenError::Empty);
        }

        let mut segments = raw.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthTokenError::Segments);
        };

        let payload = payload.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
            .map_err(|_| AuthTokenError::Encoding)?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| AuthTokenError::Payload(e.to_string()))?;

        Ok(Self {
            raw: SecretString::from(raw.to_owned()),
            exp: claims.exp,
            email: claims.email,
        })
    }

    /// Expiry instant, if the token carries a usable `exp` claim.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// `true` once `now` is past the expiry. Tokens without `exp` count as
    /// expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|exp| now > exp)
    }

    /// `email` claim, when the backend includes one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// The raw token, for forwarding to the backend.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.raw.expose_secret()
    }
}

/// Token present, decodable, and not expired at `now`.
#[must_use]
pub fn is_logged_in(token: Option<&str>, now: DateTime<Utc>) -> bool {
    token
        .and_then(|raw| AuthToken::parse(raw).ok())
        .is_some_and(|t| !t.is_expired(now))
}
