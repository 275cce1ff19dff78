//! The persisted per-book settings record.
//!
//! One JSON document per book, stored inside the book's directory in the
//! library under a fixed filename. Exactly three keys: `asin`,
//! `shelfari_url`, and `aliases`; absent keys default to empty so records
//! written by older tooling load cleanly. Writes go through a temp file and
//! rename so a failed save never truncates an existing record.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed filename of the record inside the book's directory.
pub const RECORD_FILE_NAME: &str = "book_settings.json";

/// The three persisted metadata fields for one book.
///
/// Empty string / empty map mean "not resolved yet"; the settings store only
/// runs a resolver for a field that is empty here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    /// Product identifier on the commerce site.
    #[serde(default)]
    pub asin: String,

    /// Canonical book page on the reference site.
    #[serde(default)]
    pub shelfari_url: String,

    /// Label -> alias variants, in seeding order (characters before terms).
    #[serde(default)]
    pub aliases: IndexMap<String, Vec<String>>,
}

impl SettingsRecord {
    /// Record path for a book, derived from the library root and the book's
    /// relative path.
    #[must_use]
    pub fn path_for(library_root: &Path, book_path: &Path) -> PathBuf {
        library_root.join(book_path).join(RECORD_FILE_NAME)
    }

    /// Load the record at `path`, defaulting every field when the file does
    /// not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read settings record: {e}")))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Storage(format!("Failed to parse settings record: {e}")))
    }

    /// Commit the record to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create record directory: {e}")))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Storage(format!("Failed to serialize settings record: {e}")))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| Error::Storage(format!("Failed to write settings record: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| Error::Storage(format!("Failed to replace settings record: {e}")))?;
        }

        fs::rename(&tmp_path, path)
            .map_err(|e| Error::Storage(format!("Failed to commit settings record: {e}")))?;

        debug!("saved settings record {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn path_is_library_root_plus_book_path_plus_fixed_name() {
        let path = SettingsRecord::path_for(
            Path::new("/library"),
            Path::new("Jane Doe/The Test Book (42)"),
        );
        assert_eq!(
            path,
            Path::new("/library/Jane Doe/The Test Book (42)/book_settings.json")
        );
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let record = SettingsRecord::load(&dir.path().join(RECORD_FILE_NAME)).unwrap();
        assert_eq!(record, SettingsRecord::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book").join(RECORD_FILE_NAME);

        let mut record = SettingsRecord::default();
        record.asin = "X1".into();
        record.shelfari_url = "http://u".into();
        record
            .aliases
            .insert("Bob".into(), vec!["Robert".into(), "Bobby".into()]);

        record.save(&path).unwrap();
        let reloaded = SettingsRecord::load(&path).unwrap();
        assert_eq!(reloaded, record);
    }

    #[test]
    fn absent_keys_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        fs::write(&path, r#"{"asin": "B000000001"}"#).unwrap();

        let record = SettingsRecord::load(&path).unwrap();
        assert_eq!(record.asin, "B000000001");
        assert_eq!(record.shelfari_url, "");
        assert!(record.aliases.is_empty());
    }

    #[test]
    fn malformed_record_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        fs::write(&path, "{broken").unwrap();

        assert!(matches!(
            SettingsRecord::load(&path),
            Err(Error::Storage(_))
        ));
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);

        let mut record = SettingsRecord::default();
        record.asin = "OLD".into();
        record.save(&path).unwrap();

        record.asin = "NEW".into();
        record.save(&path).unwrap();

        assert_eq!(SettingsRecord::load(&path).unwrap().asin, "NEW");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn alias_order_survives_serialization() {
        let mut record = SettingsRecord::default();
        record.aliases.insert("Zed".into(), vec![]);
        record.aliases.insert("Anna".into(), vec![]);

        let json = serde_json::to_string(&record).unwrap();
        let reloaded: SettingsRecord = serde_json::from_str(&json).unwrap();
        let labels: Vec<&String> = reloaded.aliases.keys().collect();
        assert_eq!(labels, vec!["Zed", "Anna"]);
    }
}
