//! Product-identifier (ASIN) resolution.
//!
//! Searches the commerce site's Kindle-store listing for `"<title> -
//! <author>"` and pulls the ASIN out of the first result block that carries
//! the one-click buy marker. The "no results" detection is a raw substring
//! check over the page with two exemption phrases; it is deliberately kept
//! byte-for-byte compatible with the service's known responses rather than
//! made more principled.

use crate::client::Connection;
use crate::library::{BookDatabase, MOBI_ASIN};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

#[allow(clippy::unwrap_used)]
static ASIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-asin="([a-zA-Z0-9]+)""#).unwrap());

#[allow(clippy::unwrap_used)]
static RESULTS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#resultsCol").unwrap());

const NO_MATCH_MARKER: &str = "did not match any products";
const DID_YOU_MEAN_MARKER: &str = "Did you mean:";
const ALL_DEPARTMENTS_MARKER: &str = "so we searched in All Departments";
const BUY_MARKER: &str = "Buy now with 1-Click";

/// Fixed header set for identifier searches.
pub(crate) fn headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers
}

/// Path and query string for a Kindle-store search.
///
/// The keyword value is repeated inside the `rh` refinement (where its own
/// separators stay percent-encoded) and as the plain `keywords` pair.
pub(crate) fn search_path(title: &str, author: &str) -> String {
    let pair = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("keywords", &format!("{title} - {author}"))
        .finish();
    let value = pair.trim_start_matches("keywords=");
    format!("/s/ref=sr_qz_back?sf=qz&rh=i%3Adigital-text%2Cn%3A154606011%2Ck%3A{value}&{pair}")
}

/// The short-circuit "no results" heuristic.
///
/// True only when the no-match phrase appears without either exemption
/// phrase ("did you mean" suggestions and all-departments fallbacks still
/// carry usable results).
fn is_no_match(body: &str) -> bool {
    body.contains(NO_MATCH_MARKER)
        && !body.contains(DID_YOU_MEAN_MARKER)
        && !body.contains(ALL_DEPARTMENTS_MARKER)
}

/// Extract the ASIN from a search-results page.
///
/// Scans the results column for a block containing the one-click buy marker
/// and takes the first `data-asin` attribute inside it. Multiple matches are
/// not disambiguated; first wins.
#[must_use]
pub fn extract_asin(body: &str) -> Option<String> {
    if is_no_match(body) {
        debug!("identifier search returned no products");
        return None;
    }

    let document = Html::parse_document(body);
    for results in document.select(&RESULTS_SELECTOR) {
        let html = results.html();
        if !html.contains(BUY_MARKER) {
            continue;
        }
        if let Some(captures) = ASIN_PATTERN.captures(&html) {
            return Some(captures[1].to_string());
        }
    }
    None
}

/// Resolve the ASIN for a book by title and author.
///
/// Returns `None` for no-match pages, pattern mismatches, and network
/// failures that survive the connection's single retry. On success the ASIN
/// is also written back into the library database under `mobi-asin`.
pub async fn resolve(
    conn: &mut Connection,
    db: &mut dyn BookDatabase,
    book_id: &str,
    title: &str,
    author: &str,
    user_agent: &str,
) -> Option<String> {
    let path = search_path(title, author);
    let body = match conn.get(&path, headers(user_agent)).await {
        Ok(body) => body,
        Err(err) => {
            warn!("identifier search failed for '{title} - {author}': {err}");
            return None;
        },
    };

    let asin = extract_asin(&body)?;
    info!("resolved identifier {asin} for '{title} - {author}'");

    if let Err(err) = db.set_identifier(book_id, MOBI_ASIN, &asin) {
        warn!("could not store identifier for book {book_id}: {err}");
    }

    Some(asin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::library::{BookEntry, MemoryDatabase};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULT_PAGE: &str = r#"
        <html><body>
          <div id="resultsCol">
            <div class="result" data-asin="B00TEST123">
              <span>The Test Book</span>
              <span>Buy now with 1-Click</span>
            </div>
          </div>
        </body></html>
    "#;

    const NO_BUY_PAGE: &str = r#"
        <html><body>
          <div id="resultsCol">
            <div class="result" data-asin="B00TEST123">
              <span>The Test Book</span>
            </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn search_path_form_encodes_both_occurrences() {
        let path = search_path("Book Title", "Some Author");
        assert_eq!(
            path,
            "/s/ref=sr_qz_back?sf=qz&rh=i%3Adigital-text%2Cn%3A154606011%2Ck%3A\
             Book+Title+-+Some+Author&keywords=Book+Title+-+Some+Author"
        );
    }

    #[test]
    fn no_match_page_yields_none() {
        let body = "<html>Your search did not match any products.</html>";
        assert_eq!(extract_asin(body), None);
    }

    #[test]
    fn exemption_phrases_disable_the_short_circuit() {
        // With an exemption phrase present the page is still scanned, and
        // this one carries a usable result block.
        let body = format!("<html>did not match any products. Did you mean: {RESULT_PAGE}</html>");
        assert_eq!(extract_asin(&body), Some("B00TEST123".to_string()));

        let body =
            format!("<html>did not match any products, so we searched in All Departments {RESULT_PAGE}</html>");
        assert_eq!(extract_asin(&body), Some("B00TEST123".to_string()));
    }

    #[test]
    fn extracts_asin_from_buy_block() {
        assert_eq!(extract_asin(RESULT_PAGE), Some("B00TEST123".to_string()));
    }

    #[test]
    fn block_without_buy_marker_is_skipped() {
        assert_eq!(extract_asin(NO_BUY_PAGE), None);
    }

    #[test]
    fn first_match_wins() {
        let body = r#"
            <div id="resultsCol">
              <div data-asin="B00FIRST00">Buy now with 1-Click</div>
              <div data-asin="B00SECOND0">Buy now with 1-Click</div>
            </div>
        "#;
        assert_eq!(extract_asin(body), Some("B00FIRST00".to_string()));
    }

    #[test]
    fn header_set_is_fixed() {
        let headers = headers("test-agent/1.0");
        assert_eq!(
            headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(headers.get(ACCEPT).unwrap(), "text/html");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "test-agent/1.0");
    }

    fn test_db() -> MemoryDatabase {
        let mut db = MemoryDatabase::new();
        db.insert(
            "1",
            BookEntry {
                path: PathBuf::from("a/b"),
                title: "The Test Book".into(),
                authors: vec!["Jane Doe".into()],
                identifiers: HashMap::new(),
            },
        );
        db
    }

    #[tokio::test]
    async fn resolve_writes_identifier_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s/ref=sr_qz_back"))
            .and(query_param("keywords", "The Test Book - Jane Doe"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
            .mount(&server)
            .await;

        let mut conn =
            Connection::open(&server.uri(), None, Duration::from_secs(5)).unwrap();
        let mut db = test_db();

        let asin = resolve(&mut conn, &mut db, "1", "The Test Book", "Jane Doe", "ua/1").await;
        assert_eq!(asin, Some("B00TEST123".to_string()));
        assert_eq!(
            db.identifiers("1").unwrap().get(MOBI_ASIN).unwrap(),
            "B00TEST123"
        );
    }

    #[tokio::test]
    async fn resolve_degrades_network_failure_to_none() {
        let mut conn =
            Connection::open("http://127.0.0.1:1", None, Duration::from_secs(1)).unwrap();
        let mut db = test_db();

        let asin = resolve(&mut conn, &mut db, "1", "The Test Book", "Jane Doe", "ua/1").await;
        assert_eq!(asin, None);
        assert!(db.identifiers("1").unwrap().is_empty());
    }
}
