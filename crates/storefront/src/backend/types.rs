//! Wire types for the backend REST API.

use doux_core::Product;
use serde::{Deserialize, Serialize};

/// Catalog listing in either of the shapes the backend uses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum CatalogResponse {
    List(Vec<Product>),
    Wrapped { data: Vec<Product> },
}

impl CatalogResponse {
    pub(super) fn into_products(self) -> Vec<Product> {
        match self {
            Self::List(products) | Self::Wrapped { data: products } => products,
        }
    }
}

#[derive(Serialize)]
pub(super) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Error body: `{ "error": "..." }` or `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    pub(super) fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

/// What Google handed the browser after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoogleCredential {
    /// ID token from Google Identity Services, sent as `{ "id_token": ... }`.
    IdToken(String),
    /// OAuth authorization code, sent as `{ "code": ... }`.
    Code(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shapes() {
        let bare = r#"[{"id":1,"name":"Router","price":"49.90"}]"#;
        let wrapped = r#"{"data":[{"id":"a1","name":"Cable","price":5}]}"#;

        let products = serde_json::from_str::<CatalogResponse>(bare)
            .unwrap()
            .into_products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "1");

        let products = serde_json::from_str::<CatalogResponse>(wrapped)
            .unwrap()
            .into_products();
        assert_eq!(products[0].name, "Cable");
    }

    #[test]
    fn test_google_credential_body() {
        let body = serde_json::to_string(&GoogleCredential::IdToken("abc".into())).unwrap();
        assert_eq!(body, r#"{"id_token":"abc"}"#);
        let body = serde_json::to_string(&GoogleCredential::Code("xyz".into())).unwrap();
        assert_eq!(body, r#"{"code":"xyz"}"#);
    }

    #[test]
    fn test_error_body() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Email already exists"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Email already exists"));
        let body: ErrorBody = serde_json::from_str(r#"{"message":" "}"#).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
