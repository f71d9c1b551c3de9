//! End-to-end test harness for the Doux Shop storefront.
//!
//! Each [`TestContext`] starts two servers on ephemeral ports:
//!
//! - a fake catalog/auth backend ([`FakeBackend`]) with a fixed catalog and
//!   one known account;
//! - the real storefront router, configured against that backend.
//!
//! Requests go through a cookie-keeping `reqwest` client that does not follow
//! redirects, so tests can assert on `Location` headers.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p doux-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde_json::{Value, json};

use doux_storefront::config::StorefrontConfig;
use doux_storefront::state::AppState;

/// Account the fake backend accepts out of the box.
pub const KNOWN_EMAIL: &str = "jane@example.com";
/// Password of [`KNOWN_EMAIL`].
pub const KNOWN_PASSWORD: &str = "Secret1";
/// Google ID token the fake backend accepts.
pub const GOOGLE_ID_TOKEN: &str = "google-id-token";
/// Number of products in the fake catalog.
pub const CATALOG_SIZE: usize = 12;

// =============================================================================
// Tokens
// =============================================================================

/// Unsigned JWT carrying `email` and an `exp` `expires_in` seconds from now.
#[must_use]
pub fn jwt(email: &str, expires_in: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + expires_in;
    let payload = json!({ "email": email, "exp": exp }).to_string();
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload)
    )
}

// =============================================================================
// Fake backend
// =============================================================================

/// In-memory stand-in for the catalog and auth REST API.
pub struct FakeBackend {
    products: Vec<Value>,
    users: Mutex<Vec<(String, String)>>,
    registrations: Mutex<Vec<Value>>,
    catalog_down: AtomicBool,
    catalog_requests: AtomicUsize,
    token_lifetime: Mutex<i64>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            products: catalog(),
            users: Mutex::new(vec![(KNOWN_EMAIL.to_owned(), KNOWN_PASSWORD.to_owned())]),
            registrations: Mutex::new(Vec::new()),
            catalog_down: AtomicBool::new(false),
            catalog_requests: AtomicUsize::new(0),
            token_lifetime: Mutex::new(3600),
        }
    }

    /// Make the catalog endpoint answer 503 (or recover).
    pub fn set_catalog_down(&self, down: bool) {
        self.catalog_down.store(down, Ordering::SeqCst);
    }

    /// How many times the storefront fetched the catalog.
    pub fn catalog_requests(&self) -> usize {
        self.catalog_requests.load(Ordering::SeqCst)
    }

    /// Lifetime in seconds of tokens issued from now on. Negative values
    /// issue already-expired tokens.
    pub fn set_token_lifetime(&self, seconds: i64) {
        *self.token_lifetime.lock().expect("lock") = seconds;
    }

    /// Bodies received by `POST /register`.
    pub fn registrations(&self) -> Vec<Value> {
        self.registrations.lock().expect("lock").clone()
    }

    fn token_for(&self, email: &str) -> Value {
        let lifetime = *self.token_lifetime.lock().expect("lock");
        json!({ "token": jwt(email, lifetime) })
    }

    fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/articles", get(articles))
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/api/auth/google", post(google))
            .with_state(self)
    }
}

/// Three featured products followed by enough accessories to need a
/// second page.
fn catalog() -> Vec<Value> {
    let mut products = vec![
        json!({
            "id": 1,
            "name": "Galaxy Phone",
            "price": "799.00",
            "image": "https://img.example.com/phone.jpg",
            "description": "Flagship smartphone",
            "category": "Phones",
            "stock": 3,
            "rating": "4.5"
        }),
        json!({
            "id": 2,
            "name": "Studio Headphones",
            "price": "149.90",
            "description": "Closed-back headphones",
            "category": "Audio",
            "stock": 10
        }),
        json!({
            "id": 3,
            "name": "Party Speaker",
            "price": "89.00",
            "category": "Audio",
            "stock": 0
        }),
    ];
    products.extend((4..=CATALOG_SIZE).map(|n| {
        json!({
            "id": n,
            "name": format!("USB Cable {n}"),
            "price": "5.00",
            "category": "Accessories",
            "stock": 100
        })
    }));
    products
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn articles(State(backend): State<Arc<FakeBackend>>) -> Response {
    backend.catalog_requests.fetch_add(1, Ordering::SeqCst);
    if backend.catalog_down.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "catalog offline").into_response();
    }
    Json(backend.products.clone()).into_response()
}

async fn login(State(backend): State<Arc<FakeBackend>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let known = backend
        .users
        .lock()
        .expect("lock")
        .iter()
        .any(|(e, p)| e == email && p == password);
    if known {
        Json(backend.token_for(email)).into_response()
    } else {
        rejection(StatusCode::UNAUTHORIZED, "Invalid email or password")
    }
}

async fn register(State(backend): State<Arc<FakeBackend>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    {
        let mut users = backend.users.lock().expect("lock");
        if users.iter().any(|(e, _)| *e == email) {
            return rejection(StatusCode::CONFLICT, "Email already exists");
        }
        users.push((email, password));
    }
    backend.registrations.lock().expect("lock").push(body);
    (StatusCode::CREATED, Json(json!({ "ok": true }))).into_response()
}

async fn google(State(backend): State<Arc<FakeBackend>>, Json(body): Json<Value>) -> Response {
    if body["id_token"].as_str() == Some(GOOGLE_ID_TOKEN) {
        Json(backend.token_for("google.user@example.com")).into_response()
    } else {
        rejection(StatusCode::UNAUTHORIZED, "Invalid Google credential")
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A running storefront wired to a fresh [`FakeBackend`].
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub backend: Arc<FakeBackend>,
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });
    addr
}

impl TestContext {
    /// Start the fake backend and a storefront pointing at it.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Like [`TestContext::start`], with a chance to adjust the storefront
    /// configuration first.
    pub async fn start_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let backend = Arc::new(FakeBackend::new());
        let backend_addr = spawn(Arc::clone(&backend).router()).await;

        let mut config = StorefrontConfig::local(&format!("http://{backend_addr}"));
        config.search_debounce = Duration::from_millis(20);
        configure(&mut config);
        let state = AppState::new(config).expect("Failed to build app state");
        let storefront_addr = spawn(doux_storefront::app(state)).await;

        Self {
            client: Self::client(),
            base_url: format!("http://{storefront_addr}"),
            backend,
        }
    }

    /// A fresh visitor: no cookies, no redirects followed.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET as htmx would send it.
    pub async fn htmx_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("htmx GET request failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Form POST as htmx would send it.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("htmx POST request failed")
    }

    /// Log in as [`KNOWN_EMAIL`].
    pub async fn login(&self) {
        let resp = self
            .post_form(
                "/auth/login",
                &[("email", KNOWN_EMAIL), ("password", KNOWN_PASSWORD)],
            )
            .await;
        assert_eq!(location(&resp), "/", "login should redirect home");
    }
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

/// A response header as a string, or an empty string.
#[must_use]
pub fn header(resp: &reqwest::Response, name: &str) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
