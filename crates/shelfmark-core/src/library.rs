//! The book-database collaborator.
//!
//! The library database is an external system; this module only pins down the
//! narrow contract the resolution pipeline needs from it: a book's relative
//! path inside the library, its title and author list, and its identifier
//! map. The single write path is storing a freshly resolved product
//! identifier back under [`MOBI_ASIN`].

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Identifier scheme under which a resolved ASIN is written back.
pub const MOBI_ASIN: &str = "mobi-asin";

/// Read/write contract with the external library database.
pub trait BookDatabase {
    /// Path of the book's directory, relative to the library root.
    fn path(&self, book_id: &str) -> Result<PathBuf>;

    /// Book title.
    fn title(&self, book_id: &str) -> Result<String>;

    /// Ordered author list.
    fn authors(&self, book_id: &str) -> Result<Vec<String>>;

    /// Identifier map for the book (scheme -> value).
    fn identifiers(&self, book_id: &str) -> Result<HashMap<String, String>>;

    /// Store an identifier for the book, overwriting any existing value for
    /// the scheme.
    fn set_identifier(&mut self, book_id: &str, scheme: &str, value: &str) -> Result<()>;
}

/// One book's worth of database fields.
#[derive(Debug, Clone)]
pub struct BookEntry {
    /// Directory of the book, relative to the library root.
    pub path: PathBuf,
    /// Title as stored in the library.
    pub title: String,
    /// Ordered author list.
    pub authors: Vec<String>,
    /// Identifier map (scheme -> value).
    pub identifiers: HashMap<String, String>,
}

/// In-memory [`BookDatabase`] for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    books: HashMap<String, BookEntry>,
}

impl MemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a book entry.
    pub fn insert(&mut self, book_id: impl Into<String>, entry: BookEntry) {
        self.books.insert(book_id.into(), entry);
    }

    fn entry(&self, book_id: &str) -> Result<&BookEntry> {
        self.books
            .get(book_id)
            .ok_or_else(|| Error::Library(format!("No such book: {book_id}")))
    }
}

impl BookDatabase for MemoryDatabase {
    fn path(&self, book_id: &str) -> Result<PathBuf> {
        Ok(self.entry(book_id)?.path.clone())
    }

    fn title(&self, book_id: &str) -> Result<String> {
        Ok(self.entry(book_id)?.title.clone())
    }

    fn authors(&self, book_id: &str) -> Result<Vec<String>> {
        Ok(self.entry(book_id)?.authors.clone())
    }

    fn identifiers(&self, book_id: &str) -> Result<HashMap<String, String>> {
        Ok(self.entry(book_id)?.identifiers.clone())
    }

    fn set_identifier(&mut self, book_id: &str, scheme: &str, value: &str) -> Result<()> {
        let entry = self
            .books
            .get_mut(book_id)
            .ok_or_else(|| Error::Library(format!("No such book: {book_id}")))?;
        entry
            .identifiers
            .insert(scheme.to_string(), value.to_string());
        Ok(())
    }
}
