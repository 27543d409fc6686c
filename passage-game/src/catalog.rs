//! Book catalog and answer lookup.
use csv::{QuoteStyle, ReaderBuilder, Trim, WriterBuilder};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{BUNDLED_BOOKS, CATALOG_EXPORT_COLUMNS, CATALOG_REQUIRED_COLUMNS};
use crate::error::GameError;
use crate::filename::parse_book_filename;

/// Canonical answer for a passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    /// Book filename; `None` for curated daily passages.
    #[serde(default)]
    pub source_id: Option<String>,
    /// Canonical book page, shown on the results view.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub text_url: Option<String>,
    #[serde(default)]
    pub ebook_id: Option<String>,
}

impl BookRecord {
    #[must_use]
    pub fn new(title: &str, author: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            ..Self::default()
        }
    }
}

/// Every book eligible for free play, unique by source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    records: Vec<BookRecord>,
}

impl Catalog {
    /// Build a catalog, keeping the first record for each source file.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = BookRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for record in records {
            if let Some(id) = record.source_id.as_deref()
                && !seen.insert(id.to_string())
            {
                log::warn!("duplicate catalog entry for {id}; keeping the first");
                continue;
            }
            unique.push(record);
        }
        Self { records: unique }
    }

    /// Derive records from bare filenames.
    #[must_use]
    pub fn from_filenames<S: AsRef<str>>(filenames: &[S]) -> Self {
        Self::from_records(filenames.iter().map(|f| parse_book_filename(f.as_ref())))
    }

    /// The books shipped with the game.
    #[must_use]
    pub fn bundled() -> Self {
        Self::from_filenames(&BUNDLED_BOOKS)
    }

    /// Parse the catalog CSV resource.
    ///
    /// # Errors
    ///
    /// Returns `GameError::MalformedResource` if the header is missing, lacks
    /// a required column or a row cannot be read, or `GameError::EmptyCatalog`
    /// if no usable rows remain.
    pub fn from_csv(text: &str) -> Result<Self, GameError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| GameError::malformed("catalog", err.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(GameError::malformed("catalog", "missing header row"));
        }

        let column = |name: &str| headers.iter().position(|h| h == name);
        for required in CATALOG_REQUIRED_COLUMNS {
            if column(required).is_none() {
                return Err(GameError::malformed(
                    "catalog",
                    format!("missing required column `{required}`"),
                ));
            }
        }

        let (filename_ix, title_ix, author_ix, url_ix) = (
            column("filename"),
            column("title"),
            column("author"),
            column("gutenberg_url"),
        );
        let (year_ix, text_url_ix, ebook_ix) =
            (column("year"), column("text_url"), column("ebook_id"));

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|err| GameError::malformed("catalog", err.to_string()))?;
            let field = |ix: Option<usize>| -> String {
                ix.and_then(|i| row.get(i)).unwrap_or_default().to_string()
            };
            let optional = |ix: Option<usize>| Some(field(ix)).filter(|v| !v.is_empty());

            let filename = field(filename_ix);
            if filename.is_empty() {
                let line = row.position().map_or(0, csv::Position::line);
                log::warn!("catalog line {line} has no filename; skipping");
                continue;
            }
            records.push(BookRecord {
                title: field(title_ix),
                author: field(author_ix),
                source_id: Some(filename),
                url: optional(url_ix),
                year: optional(year_ix),
                text_url: optional(text_url_ix),
                ebook_id: optional(ebook_ix),
            });
        }

        if records.is_empty() {
            return Err(GameError::EmptyCatalog {
                resource: "catalog",
            });
        }
        log::debug!("loaded {} catalog records", records.len());
        Ok(Self::from_records(records))
    }

    /// Write the catalog in the scraper's column order.
    ///
    /// # Errors
    ///
    /// Returns `GameError::MalformedResource` if a row cannot be encoded.
    pub fn to_csv(&self) -> Result<String, GameError> {
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());
        writer
            .write_record(CATALOG_EXPORT_COLUMNS)
            .map_err(export_error)?;
        for record in &self.records {
            writer
                .write_record([
                    record.title.as_str(),
                    record.author.as_str(),
                    record.year.as_deref().unwrap_or_default(),
                    record.source_id.as_deref().unwrap_or_default(),
                    record.url.as_deref().unwrap_or_default(),
                    record.text_url.as_deref().unwrap_or_default(),
                    record.ebook_id.as_deref().unwrap_or_default(),
                ])
                .map_err(export_error)?;
        }
        let bytes = writer.into_inner().map_err(export_error)?;
        String::from_utf8(bytes).map_err(export_error)
    }

    /// Append records from `other` whose ebook id and source file are new.
    pub fn merge(&mut self, other: Self) {
        let mut ebook_ids: HashSet<String> = self
            .records
            .iter()
            .filter_map(|r| r.ebook_id.clone())
            .collect();
        let mut source_ids: HashSet<String> = self
            .records
            .iter()
            .filter_map(|r| r.source_id.clone())
            .collect();
        for record in other.records {
            if let Some(id) = &record.ebook_id
                && !ebook_ids.insert(id.clone())
            {
                continue;
            }
            if let Some(id) = &record.source_id
                && !source_ids.insert(id.clone())
            {
                continue;
            }
            self.records.push(record);
        }
    }

    /// Exact lookup by source filename.
    ///
    /// # Errors
    ///
    /// Returns `GameError::RecordNotFound` if no record has this source id.
    pub fn resolve(&self, source_id: &str) -> Result<&BookRecord, GameError> {
        self.records
            .iter()
            .find(|r| r.source_id.as_deref() == Some(source_id))
            .ok_or_else(|| GameError::RecordNotFound {
                source_id: source_id.to_string(),
            })
    }

    /// Pick a random book for a free-play round.
    pub fn random_record<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&BookRecord> {
        self.records.choose(rng)
    }

    #[must_use]
    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.records.iter().filter_map(|r| r.source_id.as_deref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn export_error(err: impl std::fmt::Display) -> GameError {
    GameError::malformed("catalog", format!("could not write CSV: {err}"))
}
