//! Anonymous visitor identity.
//!
//! Every browser session gets a random [`VisitorId`] the first time it
//! touches the cart. The id lives in the session and keys the cart store, so
//! carts survive login and logout within the same session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use doux_core::VisitorId;
use tower_sessions::Session;

use crate::models::session_keys;

/// Extractor for the visitor id, minting one if the session has none.
#[derive(Debug, Clone, Copy)]
pub struct CurrentVisitor(pub VisitorId);

/// The session layer is missing or the session store failed.
#[derive(Debug)]
pub struct VisitorRejection;

impl IntoResponse for VisitorRejection {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable").into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentVisitor
where
    S: Send + Sync,
{
    type Rejection = VisitorRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(VisitorRejection)?;
        visitor_id(session).await.map(Self)
    }
}

/// Read the visitor id, creating and storing one when absent.
async fn visitor_id(session: &Session) -> Result<VisitorId, VisitorRejection> {
    if let Some(id) = session
        .get::<VisitorId>(session_keys::VISITOR_ID)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read visitor id");
            VisitorRejection
        })?
    {
        return Ok(id);
    }

    let id = VisitorId::generate();
    session
        .insert(session_keys::VISITOR_ID, id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to store visitor id");
            VisitorRejection
        })?;
    tracing::debug!(visitor = %id, "New visitor");
    Ok(id)
}
