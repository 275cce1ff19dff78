//! A resolution session over one library.
//!
//! The session owns the two long-lived service connections plus a plain
//! client for reference-page fetches. Books are processed one at a time and
//! the connections are reused sequentially across books; exclusive access is
//! enforced by the `&mut` borrows rather than a lock.

use crate::client::Connection;
use crate::config::Config;
use crate::library::BookDatabase;
use crate::settings::BookSettings;
use crate::Result;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared connection state for sequential per-book resolution.
pub struct Session {
    config: Config,
    library_root: PathBuf,
    product: Connection,
    reference: Connection,
    pages: Client,
}

impl Session {
    /// Open a session for the library rooted at `library_root`.
    ///
    /// Both service connections are constructed up front, tunneled through
    /// the configured proxy when one is present.
    pub fn new(config: Config, library_root: PathBuf) -> Result<Self> {
        let timeout = Duration::from_secs(config.search.timeout_secs);
        let product =
            Connection::open(&config.search.product_url, config.proxy.clone(), timeout)?;
        let reference =
            Connection::open(&config.search.reference_url, config.proxy.clone(), timeout)?;
        let pages = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(crate::Error::Network)?;

        Ok(Self {
            config,
            library_root,
            product,
            reference,
            pages,
        })
    }

    /// Open (and lazily resolve) the settings for one book.
    pub async fn open_book(
        &mut self,
        db: &mut dyn BookDatabase,
        book_id: &str,
    ) -> Result<BookSettings> {
        BookSettings::open(self, db, book_id).await
    }

    /// Root directory of the library this session serves.
    #[must_use]
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub(crate) fn user_agent(&self) -> &str {
        &self.config.search.user_agent
    }

    pub(crate) fn product_mut(&mut self) -> &mut Connection {
        &mut self.product
    }

    pub(crate) fn reference_mut(&mut self) -> &mut Connection {
        &mut self.reference
    }

    pub(crate) fn page_client(&self) -> &Client {
        &self.pages
    }
}
