//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the fingerprinted path for the stylesheet.
///
/// Usage in templates: `{{ ""|css_path }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_path(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(asset_path("css", "main", env!("CSS_HASH")))
}

/// Returns the fingerprinted path for the enhancement script.
///
/// Usage in templates: `{{ ""|js_path }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn js_path(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(asset_path("js", "app", env!("JS_HASH")))
}

/// Path under `/static` for an asset, falling back to the unhashed file
/// when the build script could not fingerprint it.
fn asset_path(kind: &str, stem: &str, hash: &str) -> String {
    if hash.is_empty() {
        format!("/static/{kind}/{stem}.{kind}")
    } else {
        format!("/static/{kind}/derived/{stem}.{hash}.{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path_with_hash() {
        assert_eq!(
            asset_path("css", "main", "abcd1234"),
            "/static/css/derived/main.abcd1234.css"
        );
    }

    #[test]
    fn test_asset_path_without_hash() {
        assert_eq!(asset_path("js", "app", ""), "/static/js/app.js");
    }
}
