//! Search-as-you-type suggestion dropdown.
//!
//! Typing requests are debounced per visitor: a request superseded by a
//! newer one within the quiet period answers `204 No Content`, which HTMX
//! leaves unswapped. Keyboard requests (`key=ArrowDown` etc.) are answered
//! immediately and move the selection, open a product, or fall through to
//! the full catalog search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use doux_core::{CursorAction, NavKey, SuggestionCursor, search};
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use crate::middleware::CurrentVisitor;
use crate::routes::{format_price, hx_redirect};
use crate::search::Settled;
use crate::state::AppState;

/// Deserialize empty strings as None for optional numeric fields.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Suggestion query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub search: String,
    /// `KeyboardEvent.key` of a navigation key press.
    pub key: Option<String>,
    /// Index selected before the key press.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub selected: Option<usize>,
}

/// One suggestion row.
#[derive(Debug, Clone)]
pub struct SuggestionView {
    pub href: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub selected: bool,
}

/// Suggestion dropdown template (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_suggestions.html")]
pub struct SuggestionsTemplate {
    pub query: String,
    pub suggestions: Vec<SuggestionView>,
    pub selected: Option<usize>,
    /// The trailing "show all results" row is highlighted.
    pub show_all_selected: bool,
    pub show_all_href: String,
    /// The catalog could not be loaded; offer a retry.
    pub failed: bool,
}

impl SuggestionsTemplate {
    fn failed(query: &str) -> Self {
        Self {
            query: query.to_string(),
            suggestions: Vec::new(),
            selected: None,
            show_all_selected: false,
            show_all_href: show_all_href(query),
            failed: true,
        }
    }
}

fn show_all_href(query: &str) -> String {
    format!("/?search={}", urlencoding::encode(query.trim()))
}

/// Render the suggestion dropdown.
#[instrument(skip(state, visitor))]
pub async fn suggest(
    State(state): State<AppState>,
    CurrentVisitor(visitor): CurrentVisitor,
    Query(query): Query<SuggestQuery>,
) -> Response {
    let key = match query.key.as_deref() {
        Some(raw) => match raw.parse::<NavKey>() {
            Ok(key) => Some(key),
            Err(()) => return StatusCode::NO_CONTENT.into_response(),
        },
        None => None,
    };

    // Typing is debounced; key presses are answered at once
    if key.is_none() && state.debouncer().settle(visitor).await == Settled::Superseded {
        return StatusCode::NO_CONTENT.into_response();
    }

    let needle = query.search.trim();
    if (needle.is_empty() && key.is_none()) || key == Some(NavKey::Escape) {
        return Html("").into_response();
    }

    let catalog = match state.backend().catalog().await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!(error = %e, "Suggestions unavailable");
            return SuggestionsTemplate::failed(needle).into_response();
        }
    };

    let matches = search::suggest(&catalog, needle);
    let ids = matches.iter().map(|p| p.id.clone()).collect();
    let mut cursor = SuggestionCursor::new(needle, ids).with_selected(query.selected);

    let selected = match key.map(|key| cursor.handle(key)) {
        None => None,
        Some(CursorAction::Select(selected)) => selected,
        Some(CursorAction::OpenProduct(id)) => {
            return hx_redirect(format!("/articles/{}", urlencoding::encode(id.as_str())));
        }
        Some(CursorAction::ShowAll(search)) => return hx_redirect(show_all_href(&search)),
        Some(CursorAction::Hide) => return Html("").into_response(),
        Some(CursorAction::Nothing) => return StatusCode::NO_CONTENT.into_response(),
    };

    let currency = state.config().currency;
    let suggestions = matches
        .iter()
        .enumerate()
        .map(|(i, product)| SuggestionView {
            href: format!("/articles/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            price: format_price(product.price, currency),
            image: product.image_or_default().to_string(),
            selected: selected == Some(i),
        })
        .collect();

    SuggestionsTemplate {
        query: needle.to_string(),
        suggestions,
        selected,
        show_all_selected: selected == Some(cursor.show_all_index()),
        show_all_href: show_all_href(needle),
        failed: false,
    }
    .into_response()
}
