//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before rendering an error page. Route handlers return
//! `Result<T, AppError>`.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::ApiError;
use crate::filters;
use crate::routes::Layout;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// The catalog or auth backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] Arc<ApiError>),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self::Backend(Arc::new(err))
    }
}

/// Full-page error view.
#[derive(Template, WebTemplate)]
#[template(path = "errors/error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    pub status: u16,
    pub title: &'static str,
    pub message: String,
    /// Offer a link that reloads the same URL.
    pub retry: bool,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) if err.is_server_error() => StatusCode::BAD_GATEWAY,
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(_) | Self::Session(_) => true,
            Self::Auth(err) => err.is_server_error(),
            Self::NotFound(_) => false,
        }
    }

    /// Page title and visitor-facing message.
    ///
    /// Internal details never reach the client.
    fn describe(&self) -> (&'static str, String) {
        match self {
            Self::Backend(_) => (
                "Shop unavailable",
                "We could not reach the shop right now. Please try again in a moment."
                    .to_string(),
            ),
            Self::Auth(err) => ("Sign-in problem", err.user_message()),
            Self::NotFound(_) => (
                "Not found",
                "The page or product you were looking for does not exist.".to_string(),
            ),
            Self::Session(_) => (
                "Something went wrong",
                "An unexpected error occurred. Please try again.".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let (title, message) = self.describe();
        let page = ErrorTemplate {
            layout: Layout::anonymous(),
            status: status.as_u16(),
            title,
            message,
            retry: matches!(self, Self::Backend(_)),
        };

        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a successful login.
pub fn set_sentry_user(email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::MissingToken.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::Rejected("taken".to_string()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_backend_error_page_offers_retry_and_hides_details() {
        let err: AppError = ApiError::Status {
            status: 500,
            message: "db password wrong".to_string(),
        }
        .into();
        let response = err.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Try again"));
        assert!(!html.contains("db password"));
    }
}
