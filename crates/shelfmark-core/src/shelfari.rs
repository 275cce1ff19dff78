//! Reference-page URL resolution.
//!
//! Searches the community reference site's book search and extracts the
//! first `/books/` link from the response. Callers try the resolved ASIN as
//! the keyword first and fall back to `"<title> - <author>"`; each attempt
//! that yields nothing simply falls through.

use crate::client::Connection;
use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

#[allow(clippy::unwrap_used)]
static BOOK_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(.+/books/.+?)""#).unwrap());

const NO_RESULTS_MARKER: &str = "did not return any results";

/// Path and query string for a book search.
pub(crate) fn search_path(keywords: &str) -> String {
    let pair = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("Keywords", keywords)
        .finish();
    format!("/search/books?{pair}")
}

/// Extract the first book-page link from a search response.
#[must_use]
pub fn extract_book_url(body: &str) -> Option<String> {
    if body.contains(NO_RESULTS_MARKER) {
        debug!("reference search returned no results");
        return None;
    }
    BOOK_URL_PATTERN
        .captures(body)
        .map(|captures| captures[1].to_string())
}

/// Resolve the reference-page URL for one keyword attempt.
///
/// No special header set is required for this service. Network failures
/// that survive the connection's single retry yield `None`.
pub async fn resolve(conn: &mut Connection, keywords: &str) -> Option<String> {
    let path = search_path(keywords);
    let body = match conn.get(&path, HeaderMap::new()).await {
        Ok(body) => body,
        Err(err) => {
            warn!("reference search failed for '{keywords}': {err}");
            return None;
        },
    };
    extract_book_url(&body)
}
