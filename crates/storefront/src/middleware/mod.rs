//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the request span)
//! 4. Security headers (CSP, frame and cache policy)
//! 5. Session layer (tower-sessions with `MemoryStore`)
//! 6. Rate limiting (governor) on selected routes
//!
//! Extractors: [`RequireAuth`], [`OptionalAuth`], [`CurrentVisitor`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod visitor;

pub use auth::{OptionalAuth, RequireAuth, clear_auth_token, set_auth_token};
pub use rate_limit::{auth_rate_limiter, suggest_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use visitor::CurrentVisitor;
