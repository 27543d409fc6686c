//! Centralized tuning constants for the passage engine.
//!
//! Passage size, the daily epoch and the match threshold decide what a player
//! sees and which answers are accepted. They live here so that gameplay only
//! changes through reviewed code, never through the fetched resources.

// Passage selection ---------------------------------------------------------
/// Number of words in every selected window.
pub const PASSAGE_WORDS: usize = 100;
/// Raw texts shorter than this many bytes are rejected before tokenizing.
pub const MIN_SOURCE_BYTES: usize = 100;
/// Inserted between the displayed passage and an extra window.
pub const MORE_TEXT_SEPARATOR: &str = "\n\n...\n\n";

// Daily mode ----------------------------------------------------------------
pub const DAILY_EPOCH_YEAR: i32 = 2024;
pub const DAILY_EPOCH_MONTH: u32 = 1;
pub const DAILY_EPOCH_DAY: u32 = 1;

// Source boundaries ---------------------------------------------------------
pub const GUTENBERG_START_MARKER: &str = "*** START OF";
pub const GUTENBERG_END_MARKER: &str = "*** END OF";
/// Books live under this namespace relative to the asset root.
pub const BOOKS_NAMESPACE: &str = "books";

// Matching ------------------------------------------------------------------
/// A guess must be strictly more similar than this to count as a typo match.
pub const SIMILARITY_THRESHOLD: f64 = 0.80;

// Multiple choice -----------------------------------------------------------
pub const CHOICE_COUNT: usize = 4;

// Result store keys ---------------------------------------------------------
pub const KEY_HINTS_USED: &str = "arrowsUsed";
pub const KEY_WINNING_TITLE: &str = "winningBookTitle";
pub const KEY_WINNING_AUTHOR: &str = "winningBookAuthor";
pub const KEY_WINNING_URL: &str = "winningBookUrl";

// Catalog -------------------------------------------------------------------
pub const CATALOG_REQUIRED_COLUMNS: [&str; 4] = ["filename", "title", "author", "gutenberg_url"];
pub const CATALOG_EXPORT_COLUMNS: [&str; 7] = [
    "title",
    "author",
    "year",
    "filename",
    "gutenberg_url",
    "text_url",
    "ebook_id",
];

/// Books shipped with the game when no catalog resource is available.
pub const BUNDLED_BOOKS: [&str; 10] = [
    "SimpleSabotageFieldManual_OfficeOfStrategicServices.txt",
    "Ulysses_JamesJoyce.txt",
    "Middlemarch_GeorgeEliot.txt",
    "A_Study_in_Scarlet_Doyle_Arthur_Conan.txt",
    "Romeo_and_Juliet_Shakespeare_William.txt",
    "The_Scarlet_Letter_Hawthorne_Nathaniel.txt",
    "The_Blue_Castle_a_novel_Montgomery_L_M.txt",
    "Wuthering_Heights_Brontë_Emily.txt",
    "The_Iliad_Homer_751_BCE-651_BCE.txt",
    "Beowulf_An_Anglo-Saxon_Epic_Poem_Unknown.txt",
];
