//! # shelfmark-core
//!
//! Resolve and persist companion metadata for books in a personal digital
//! library: a product identifier (ASIN), a reference-site book page URL, and
//! a user-curated mapping of character/term aliases.
//!
//! ## Architecture
//!
//! - **Session**: owns one reusable connection per external search service
//!   (optionally proxy-tunneled) plus a plain client for page fetches; books
//!   are processed one at a time and the connections are reused across them.
//! - **Resolvers**: the identifier search, the reference-page search, and
//!   the alias extractor. Every resolution failure (no match, or network
//!   trouble after one reconnect-and-retry) degrades to an empty field the
//!   user can fill in manually.
//! - **Settings store**: [`BookSettings`] loads the per-book JSON record,
//!   lazily resolves only the fields that are empty, and exposes mutators
//!   plus an explicit [`BookSettings::save`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use shelfmark_core::{Config, MemoryDatabase, Result, Session};
//! use std::path::PathBuf;
//!
//! # async fn run() -> Result<()> {
//! let config = Config::load()?;
//! let mut session = Session::new(config, PathBuf::from("/library"))?;
//! let mut db = MemoryDatabase::new();
//!
//! let mut settings = session.open_book(&mut db, "42").await?;
//! settings.set_alias("Bob", "Robert, Bobby");
//! settings.save()?;
//! # Ok(())
//! # }
//! ```

/// Product-identifier (ASIN) resolution
pub mod asin;
/// Reusable outbound connections with reconnect-and-retry
pub mod client;
/// TOML configuration and proxy discovery
pub mod config;
/// Error types and result alias
pub mod error;
/// The book-database collaborator contract
pub mod library;
/// Reference-page character/term extraction
pub mod page;
/// The persisted per-book settings record
pub mod record;
/// Reference-page URL resolution
pub mod shelfari;
/// The resolution session shared across books
pub mod session;
/// Per-book settings store with lazy resolution
pub mod settings;

pub use client::Connection;
pub use config::{Config, ProxyConfig, SearchConfig, DEFAULT_USER_AGENT};
pub use error::{Error, Result};
pub use library::{BookDatabase, BookEntry, MemoryDatabase, MOBI_ASIN};
pub use page::{Entity, ReferencePage};
pub use record::{SettingsRecord, RECORD_FILE_NAME};
pub use session::Session;
pub use settings::BookSettings;
