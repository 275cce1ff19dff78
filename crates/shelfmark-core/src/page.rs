//! Reference-page parsing: labelled characters and glossary terms.
//!
//! The book's reference page carries community-curated character and
//! glossary listings. Only the labels (and their wiki keys) are taken; the
//! alias lists they seed start out empty and are filled in by the user.

use crate::Result;
use indexmap::IndexMap;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::unwrap_used)]
static CHARACTERS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#WikiModule_Characters li a").unwrap());

#[allow(clippy::unwrap_used)]
static GLOSSARY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#WikiModule_Glossary li a").unwrap());

/// One labelled entity from the reference page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Wiki key, taken from the trailing segment of the entity link.
    pub key: String,
    /// Display label.
    pub label: String,
}

/// Parsed character and glossary listings from one reference page.
#[derive(Debug, Clone, Default)]
pub struct ReferencePage {
    /// Characters, in page order.
    pub characters: Vec<Entity>,
    /// Glossary terms, in page order.
    pub terms: Vec<Entity>,
}

impl ReferencePage {
    /// Fetch and parse the reference page at `url`.
    pub async fn fetch(client: &Client, url: &str) -> Result<Self> {
        let response = client.get(url).send().await?;
        let body = response.text().await?;
        let page = Self::parse(&body);
        debug!(
            "reference page {} yielded {} characters, {} terms",
            url,
            page.characters.len(),
            page.terms.len()
        );
        Ok(page)
    }

    /// Parse a reference page body.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let document = Html::parse_document(body);
        Self {
            characters: collect_entities(&document, &CHARACTERS_SELECTOR),
            terms: collect_entities(&document, &GLOSSARY_SELECTOR),
        }
    }

    /// Seed an alias mapping from the listings.
    ///
    /// Every character then every term, in that enumeration order, maps its
    /// label to an empty variant list. A later entity with the same label
    /// overwrites the earlier (empty) entry; map-key uniqueness is the only
    /// dedup applied.
    #[must_use]
    pub fn seed_aliases(&self) -> IndexMap<String, Vec<String>> {
        let mut aliases = IndexMap::new();
        for entity in self.characters.iter().chain(self.terms.iter()) {
            aliases.insert(entity.label.clone(), Vec::new());
        }
        aliases
    }
}

fn collect_entities(document: &Html, selector: &Selector) -> Vec<Entity> {
    document
        .select(selector)
        .filter_map(|anchor| {
            let label = anchor.text().collect::<String>().trim().to_string();
            if label.is_empty() {
                return None;
            }
            let key = anchor
                .value()
                .attr("href")
                .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
                .unwrap_or(&label)
                .to_string();
            Some(Entity { key, label })
        })
        .collect()
}
