//! Per-book settings store with lazy resolution.
//!
//! Opening a book loads its persisted record and resolves only the fields
//! that are still empty: the identifier (stored `mobi-asin` wins over a
//! fresh search), then the reference-page URL (identifier keyword first,
//! title+author fallback), then the alias seeding (only once a reference
//! page is known). A resolver finding nothing leaves its field empty; that
//! is a normal terminal state, never an error. Once non-empty, a field is
//! authoritative and is not re-resolved.

use crate::library::{BookDatabase, MOBI_ASIN};
use crate::page::ReferencePage;
use crate::record::SettingsRecord;
use crate::session::Session;
use crate::{asin, shelfari, Result};
use indexmap::IndexMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Sentinel the library database uses for missing titles and authors.
const UNKNOWN: &str = "Unknown";

/// Editor-facing settings for one book.
///
/// Mutators touch memory only; [`BookSettings::save`] is the explicit commit
/// and the only operation here whose failure surfaces to the caller.
pub struct BookSettings {
    book_id: String,
    title: String,
    author: String,
    record_path: PathBuf,
    record: SettingsRecord,
}

impl BookSettings {
    /// Load the persisted record for `book_id` and resolve any empty fields.
    pub(crate) async fn open(
        session: &mut Session,
        db: &mut dyn BookDatabase,
        book_id: &str,
    ) -> Result<Self> {
        let title = db.title(book_id)?;
        let author = db.authors(book_id)?.join(" & ");
        let book_path = db.path(book_id)?;
        let record_path = SettingsRecord::path_for(session.library_root(), &book_path);

        let freshly_created = !record_path.exists();
        let mut record = SettingsRecord::load(&record_path)?;
        if freshly_created {
            // The record exists on disk from first open onward, empty fields
            // included.
            record.save(&record_path)?;
        }

        let mut settings = Self {
            book_id: book_id.to_string(),
            title,
            author,
            record_path,
            record,
        };

        settings.resolve_asin(session, db).await?;
        settings.resolve_shelfari_url(session).await?;
        settings.resolve_aliases(session).await?;

        Ok(settings)
    }

    /// Step 2: identifier. Stored `mobi-asin` wins; the search runs only
    /// when the database has nothing and neither title nor author is the
    /// `Unknown` sentinel.
    async fn resolve_asin(&mut self, session: &mut Session, db: &mut dyn BookDatabase) -> Result<()> {
        if !self.record.asin.is_empty() {
            debug!("identifier already persisted for book {}", self.book_id);
            return Ok(());
        }

        let known = db
            .identifiers(&self.book_id)?
            .get(MOBI_ASIN)
            .filter(|value| !value.is_empty())
            .cloned();

        let resolved = if let Some(asin) = known {
            debug!("using stored {MOBI_ASIN} for book {}", self.book_id);
            Some(asin)
        } else if self.title != UNKNOWN && self.author != UNKNOWN {
            let user_agent = session.user_agent().to_string();
            asin::resolve(
                session.product_mut(),
                db,
                &self.book_id,
                &self.title,
                &self.author,
                &user_agent,
            )
            .await
        } else {
            None
        };

        if let Some(asin) = resolved {
            self.record.asin = asin;
            self.record.save(&self.record_path)?;
        }
        Ok(())
    }

    /// Step 3: reference-page URL, identifier keyword first.
    async fn resolve_shelfari_url(&mut self, session: &mut Session) -> Result<()> {
        if !self.record.shelfari_url.is_empty() {
            return Ok(());
        }

        let mut url = None;
        if !self.record.asin.is_empty() {
            url = shelfari::resolve(session.reference_mut(), &self.record.asin).await;
        }
        if url.is_none() && self.title != UNKNOWN && self.author != UNKNOWN {
            url = shelfari::resolve(session.reference_mut(), &self.title_and_author()).await;
        }

        if let Some(url) = url {
            self.record.shelfari_url = url;
            self.record.save(&self.record_path)?;
        }
        Ok(())
    }

    /// Step 4: alias seeding, only once a reference page is known and only
    /// while the mapping is empty.
    async fn resolve_aliases(&mut self, session: &mut Session) -> Result<()> {
        if !self.record.aliases.is_empty() || self.record.shelfari_url.is_empty() {
            return Ok(());
        }

        match ReferencePage::fetch(session.page_client(), &self.record.shelfari_url).await {
            Ok(page) => {
                self.record.aliases = page.seed_aliases();
                self.record.save(&self.record_path)?;
            },
            Err(err) => {
                // Leaves the mapping empty for a later attempt or manual fill.
                warn!(
                    "could not extract aliases from {}: {err}",
                    self.record.shelfari_url
                );
            },
        }
        Ok(())
    }

    /// Book title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Authors joined with `" & "`.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// The `"<title> - <author>"` display and search string.
    #[must_use]
    pub fn title_and_author(&self) -> String {
        format!("{} - {}", self.title, self.author)
    }

    /// Current identifier, empty when unresolved.
    #[must_use]
    pub fn asin(&self) -> &str {
        &self.record.asin
    }

    /// Current reference-page URL, empty when unresolved.
    #[must_use]
    pub fn shelfari_url(&self) -> &str {
        &self.record.shelfari_url
    }

    /// Current alias mapping.
    #[must_use]
    pub fn aliases(&self) -> &IndexMap<String, Vec<String>> {
        &self.record.aliases
    }

    /// Path of the persisted record backing these settings.
    #[must_use]
    pub fn record_path(&self) -> &std::path::Path {
        &self.record_path
    }

    /// Replace the identifier in memory.
    pub fn set_asin(&mut self, value: impl Into<String>) {
        self.record.asin = value.into();
    }

    /// Replace the reference-page URL in memory.
    pub fn set_shelfari_url(&mut self, value: impl Into<String>) {
        self.record.shelfari_url = value.into();
    }

    /// Replace the variants for `label` from a comma-joined editor field.
    ///
    /// The literal `", "` separator is collapsed before splitting on commas;
    /// no other trimming is applied. An empty input clears the list.
    pub fn set_alias(&mut self, label: impl Into<String>, comma_joined: &str) {
        self.record
            .aliases
            .insert(label.into(), split_variants(comma_joined));
    }

    /// Commit the in-memory fields to the persisted record.
    ///
    /// Never called implicitly; mutations stay in memory until the editor
    /// confirms.
    pub fn save(&self) -> Result<()> {
        self.record.save(&self.record_path)
    }
}

fn split_variants(comma_joined: &str) -> Vec<String> {
    if comma_joined.is_empty() {
        return Vec::new();
    }
    comma_joined
        .replace(", ", ",")
        .split(',')
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn split_variants_strips_only_the_literal_separator() {
        assert_eq!(split_variants("Robert, Bobby"), vec!["Robert", "Bobby"]);
        assert_eq!(split_variants("Robert,Bobby"), vec!["Robert", "Bobby"]);
        // A space not following a comma is preserved.
        assert_eq!(
            split_variants("Robert , Bobby"),
            vec!["Robert ", "Bobby"]
        );
        assert_eq!(split_variants("Solo"), vec!["Solo"]);
        assert_eq!(split_variants(""), Vec::<String>::new());
    }
}
