//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for a fingerprinted static asset.
///
/// The hashes are computed at build time. Known assets are `"main.css"`,
/// `"search.js"` and `"google.js"`; anything else hashes to the empty string.
///
/// Usage in templates: `{{ "main.css"|asset_hash }}`
#[askama::filter_fn]
pub fn asset_hash(asset: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(match asset.to_string().as_str() {
        "main.css" => env!("CSS_HASH"),
        "search.js" => env!("SEARCH_JS_HASH"),
        "google.js" => env!("GOOGLE_JS_HASH"),
        _ => "",
    })
}
