//! Backend client implementation.

use std::sync::Arc;

use doux_core::{NewUser, Product, ProductId};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::ApiError;
use super::types::{CatalogResponse, ErrorBody, GoogleCredential, LoginRequest, TokenResponse};
use crate::config::BackendConfig;

/// Only one catalog is ever cached.
const CATALOG_KEY: &str = "catalog";

/// Auth API path for Google sign-in.
const GOOGLE_AUTH_PATH: &str = "/api/auth/google";

/// Shared, immutable catalog snapshot.
pub type Catalog = Arc<[Product]>;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the catalog and auth REST API.
///
/// Cheap to clone. The catalog is cached for the configured TTL.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    config: BackendConfig,
    catalog: Cache<&'static str, Catalog>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                config: config.clone(),
                catalog,
            }),
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// The full catalog, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched or parsed. Failures
    /// are not cached.
    pub async fn catalog(&self) -> Result<Catalog, Arc<ApiError>> {
        self.inner
            .catalog
            .try_get_with(CATALOG_KEY, self.fetch_catalog())
            .await
    }

    /// Look up one product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, Arc<ApiError>> {
        let catalog = self.catalog().await?;
        Ok(catalog.iter().find(|p| &p.id == id).cloned())
    }

    #[instrument(skip(self), fields(url = %self.inner.config.catalog_url()))]
    async fn fetch_catalog(&self) -> Result<Catalog, ApiError> {
        let request = self.inner.client.get(self.inner.config.catalog_url());
        let response: CatalogResponse = Self::execute(request).await?;
        let products = response.into_products();
        debug!(count = products.len(), "Fetched catalog");
        Ok(products.into())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with the backend's message when the
    /// credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<String, ApiError> {
        let request = self
            .inner
            .client
            .post(self.inner.config.auth_endpoint("/login"))
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            });
        let response: TokenResponse = Self::execute(request).await?;
        response.token.ok_or(ApiError::MissingToken)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with the backend's message when the
    /// account is refused (for example a duplicate email).
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn register(&self, user: &NewUser) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.inner.config.auth_endpoint("/register"))
            .json(user);
        Self::send(request).await.map(drop)
    }

    /// Exchange a Google credential for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credential.
    #[instrument(skip(self, credential))]
    pub async fn google(&self, credential: &GoogleCredential) -> Result<String, ApiError> {
        let request = self
            .inner
            .client
            .post(self.inner.config.auth_endpoint(GOOGLE_AUTH_PATH))
            .json(credential);
        let response: TokenResponse = Self::execute(request).await?;
        response.token.ok_or(ApiError::MissingToken)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let body = Self::send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and return the success body as text.
    async fn send(request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }
}

/// Message to show for an error body: the JSON `error`/`message` field, or
/// the plain text itself.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.into_message().unwrap_or_default();
    }
    body.trim().chars().take(200).collect()
}
