//! Filesystem and in-memory implementations of the engine's platform traits.

use passage_game::constants::BOOKS_NAMESPACE;
use passage_game::{ChoiceField, PassageSource, ResultStore, SessionView};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const CATALOG_FILE: &str = "book_metadata.csv";
pub const DAILY_FILE: &str = "famous_passages.json";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("book filename {0:?} is not a plain file name")]
    InvalidFilename(String),
}

/// Reads the catalog, daily passages and books from an asset directory.
#[derive(Debug, Clone)]
pub struct FsPassageSource {
    root: PathBuf,
}

impl FsPassageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fixture assets shipped with the tester.
    pub fn default_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn book_path(&self, filename: &str) -> Result<PathBuf, AssetError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {
                Ok(self.root.join(BOOKS_NAMESPACE).join(filename))
            }
            _ => Err(AssetError::InvalidFilename(filename.to_string())),
        }
    }

    fn read(&self, path: &Path) -> Result<String, AssetError> {
        log::debug!("reading {}", path.display());
        fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl PassageSource for FsPassageSource {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<String, Self::Error> {
        self.read(&self.root.join(CATALOG_FILE))
    }

    fn load_daily(&self) -> Result<String, Self::Error> {
        self.read(&self.root.join(DAILY_FILE))
    }

    fn load_book_text(&self, filename: &str) -> Result<String, Self::Error> {
        let path = self.book_path(filename)?;
        self.read(&path)
    }
}

/// Session-scoped key/value store.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    items: RefCell<BTreeMap<String, String>>,
}

impl ResultStore for MemoryResultStore {
    type Error = Infallible;

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.items.borrow().get(key).cloned())
    }
}

/// Headless view that records what a player would have seen.
#[derive(Debug, Default, Clone)]
pub struct TranscriptView {
    pub passage: String,
    pub word_count: usize,
    pub hints_used: u32,
    pub title_choices: Vec<String>,
    pub author_choices: Vec<String>,
    pub errors: Vec<String>,
    pub more_text_enabled: bool,
    pub daily_info_visible: bool,
}

impl SessionView for TranscriptView {
    fn show_passage(&mut self, text: &str, word_count: usize) {
        self.passage = text.to_string();
        self.word_count = word_count;
    }

    fn show_hints_used(&mut self, hints_used: u32) {
        self.hints_used = hints_used;
    }

    fn show_choices(&mut self, field: ChoiceField, options: &[String]) {
        let slot = match field {
            ChoiceField::Title => &mut self.title_choices,
            ChoiceField::Author => &mut self.author_choices,
        };
        *slot = options.to_vec();
    }

    fn show_error(&mut self, message: &str) {
        self.passage = message.to_string();
        self.word_count = 0;
        self.errors.push(message.to_string());
    }

    fn set_more_text_enabled(&mut self, enabled: bool) {
        self.more_text_enabled = enabled;
    }

    fn set_daily_info_visible(&mut self, visible: bool) {
        self.daily_info_visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_assets_are_readable() {
        let source = FsPassageSource::new(FsPassageSource::default_root());
        assert!(source.load_catalog().unwrap().starts_with("title,author"));
        assert!(source.load_daily().unwrap().contains("\"passages\""));
        let text = source
            .load_book_text("Dracula_Stoker_Bram.txt")
            .unwrap();
        assert!(text.contains("*** START OF"));
    }

    #[test]
    fn book_paths_stay_inside_books_dir() {
        let source = FsPassageSource::new("/assets");
        assert_eq!(
            source.book_path("Emma.txt").unwrap(),
            PathBuf::from("/assets/books/Emma.txt")
        );
        for bad in ["../secret.txt", "nested/Emma.txt", "/etc/passwd", ""] {
            assert!(
                matches!(source.book_path(bad), Err(AssetError::InvalidFilename(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let source = FsPassageSource::new(std::env::temp_dir().join("passage-missing-assets"));
        let err = source.load_catalog().unwrap_err();
        assert!(err.to_string().contains(CATALOG_FILE));
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryResultStore::default();
        store.set_item("arrowsUsed", "1").unwrap();
        store.set_item("arrowsUsed", "2").unwrap();
        assert_eq!(store.get_item("arrowsUsed").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get_item("winningBookTitle").unwrap(), None);
    }
}
