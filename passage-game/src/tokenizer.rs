//! Source text cleaning and word tokenization.
//!
//! Raw book text carries license headers, chapter headings, page numbers and
//! editorial brackets. None of that belongs in a passage, so the tokenizer
//! trims the text to its content region and drops noise tokens before any
//! window is selected.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::constants::{
    GUTENBERG_END_MARKER, GUTENBERG_START_MARKER, MIN_SOURCE_BYTES, PASSAGE_WORDS,
};
use crate::error::GameError;

static NOISE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^(CHAPTER|BOOK|PART)\.?$",
        r"(?i)^PRELUDE",
        r"(?i)^FINALE",
        r"^(CONTENTS|Contents)[.:]?$",
        r"(?i)gutenberg",
        r"^\[.*\]$",
        r"^[—–-].*[—–-]$",
        r"^[—–-]+$",
        r"^\d+$",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

// Title-case labels only count as headings when a numeral follows, so the
// prose words "Chapter" and "Book" survive.
static HEADING_LABEL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(CHAPTER|BOOK|PART|Chapter|Book|Part)\.?$").ok());
static HEADING_NUMERAL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([IVXLC]+|\d+)[.:]?$").ok());

fn pattern_matches(pattern: &Option<Regex>, token: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(token))
}

/// Start and end delimiters around the content of a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries<'a> {
    pub start: &'a str,
    pub end: &'a str,
}

impl Boundaries<'static> {
    /// Project Gutenberg license header/footer markers.
    pub const GUTENBERG: Self = Self {
        start: GUTENBERG_START_MARKER,
        end: GUTENBERG_END_MARKER,
    };
}

/// Ordered, noise-free words of a source text.
///
/// Only the tokenizer builds these, so every element is a non-empty token
/// without whitespace that passed the noise filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSequence(Vec<String>);

impl WordSequence {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrow `len` words starting at `start`, if the window fits.
    #[must_use]
    pub fn window(&self, start: usize, len: usize) -> Option<&[String]> {
        let end = start.checked_add(len)?;
        self.0.get(start..end)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Whether a single token is heading, boilerplate or page-number noise.
#[must_use]
pub fn is_noise(token: &str) -> bool {
    NOISE_PATTERNS.is_match(token)
}

/// Drop noise tokens and whole chapter headings.
///
/// A numeral is only dropped right after a heading label, which keeps the
/// pronoun "I." in prose.
fn clean_tokens<'t>(tokens: &[&'t str]) -> Vec<&'t str> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut after_label = false;
    for (index, &token) in tokens.iter().enumerate() {
        let numeral_follows = tokens
            .get(index + 1)
            .is_some_and(|next| pattern_matches(&HEADING_NUMERAL, next));
        let is_label = pattern_matches(&HEADING_LABEL, token)
            && (numeral_follows || token.chars().all(|c| !c.is_lowercase()));
        if is_label {
            after_label = true;
            continue;
        }
        let heading_numeral = after_label && pattern_matches(&HEADING_NUMERAL, token);
        after_label = false;
        if !heading_numeral && !is_noise(token) {
            kept.push(token);
        }
    }
    kept
}

/// Slice of `text` strictly between the boundary markers.
///
/// Content begins on the line after the start marker, which skips the rest of
/// a `*** START OF ... ***` banner. Falls back to the whole text when either
/// marker is missing or the end marker precedes the start marker.
#[must_use]
pub fn content_region<'t>(text: &'t str, boundaries: &Boundaries<'_>) -> &'t str {
    let (Some(start_idx), Some(end_idx)) = (text.find(boundaries.start), text.find(boundaries.end))
    else {
        return text;
    };
    let after_marker = start_idx + boundaries.start.len();
    if end_idx < after_marker {
        return text;
    }
    let content_start = text[after_marker..]
        .find('\n')
        .map_or(end_idx, |offset| after_marker + offset + 1)
        .min(end_idx);
    &text[content_start..end_idx]
}

/// Split `text` into a clean word sequence.
///
/// # Errors
///
/// Returns `GameError::InsufficientText` if the text is shorter than the
/// minimum source size or fewer than 100 words survive cleaning.
pub fn tokenize(text: &str, boundaries: Option<&Boundaries<'_>>) -> Result<WordSequence, GameError> {
    if text.len() < MIN_SOURCE_BYTES {
        return Err(GameError::InsufficientText {
            found: text.split_whitespace().count(),
        });
    }

    let region = boundaries.map_or(text, |b| content_region(text, b));
    let tokens: Vec<&str> = region.split_whitespace().collect();
    let words: Vec<String> = clean_tokens(&tokens)
        .into_iter()
        .map(str::to_string)
        .collect();

    log::debug!(
        "tokenized {} words from {} bytes of content",
        words.len(),
        region.len()
    );

    if words.len() < PASSAGE_WORDS {
        return Err(GameError::InsufficientText { found: words.len() });
    }
    Ok(WordSequence(words))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (1..=count)
            .map(|n| format!("word{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn keeps_every_non_numeric_word() {
        let words = tokenize(&numbered_words(150), None).unwrap();
        assert_eq!(words.len(), 150);
        assert_eq!(words.as_slice()[0], "word1");
        assert_eq!(words.as_slice()[149], "word150");
    }

    #[test]
    fn drops_page_numbers_exactly() {
        let text: String = (1..=150)
            .map(|n| {
                if n % 10 == 0 {
                    n.to_string()
                } else {
                    format!("w{n}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let words = tokenize(&text, None).unwrap();
        assert_eq!(words.len(), 135);
        assert!(words.iter().all(|w| w.starts_with('w')));
    }

    #[test]
    fn noise_filter_covers_headings_and_annotations() {
        for token in [
            "CHAPTER",
            "CHAPTER.",
            "BOOK",
            "PRELUDE",
            "Finale.",
            "CONTENTS",
            "Contents:",
            "Gutenberg-tm",
            "[Illustration]",
            "[Illustration:",
            "—",
            "--",
            "—Ed.—",
            "42",
        ] {
            let expected = token != "[Illustration:";
            assert_eq!(is_noise(token), expected, "token {token:?}");
        }
        for token in ["chapter", "book", "self-made", "word", "1st", "I."] {
            assert!(!is_noise(token), "token {token:?} should survive");
        }
    }

    #[test]
    fn whole_chapter_headings_are_dropped() {
        let text = format!(
            "CHAPTER XII.\n\n{}\n\nChapter IV\n\n{}\n\nBOOK 2\nPart III: {}",
            numbered_words(60),
            numbered_words(60),
            numbered_words(5)
        );
        let words = tokenize(&text, None).unwrap();
        assert_eq!(words.len(), 125);
        for leaked in ["XII.", "Chapter", "IV", "2", "Part", "III:"] {
            assert!(!words.iter().any(|w| w == leaked), "{leaked} leaked");
        }
    }

    #[test]
    fn prose_labels_and_pronoun_survive() {
        let prose = "I. said the next Chapter would wait, and I. meant it; Book lovers agree";
        let text = format!("{prose} {}", numbered_words(100));
        let words = tokenize(&text, None).unwrap();
        assert_eq!(words.len(), 114);
        assert_eq!(
            words.iter().filter(|w| *w == "I.").count(),
            2,
            "pronoun dropped"
        );
        assert!(words.iter().any(|w| w == "Chapter"));
        assert!(words.iter().any(|w| w == "Book"));
    }

    #[test]
    fn region_skips_banner_line_and_footer() {
        let text = "License preamble\n*** START OF THE PROJECT GUTENBERG EBOOK X ***\nalpha beta\n*** END OF THE PROJECT GUTENBERG EBOOK X ***\nfooter";
        let region = content_region(text, &Boundaries::GUTENBERG);
        assert_eq!(region, "alpha beta\n");
    }

    #[test]
    fn region_falls_back_to_full_text() {
        let only_start = "*** START OF it\nbody";
        assert_eq!(content_region(only_start, &Boundaries::GUTENBERG), only_start);
        let reversed = "*** END OF it\nbody\n*** START OF it\n";
        assert_eq!(content_region(reversed, &Boundaries::GUTENBERG), reversed);
    }

    #[test]
    fn boundaries_limit_tokenized_words() {
        let header = "Project header words that should vanish entirely here";
        let text = format!(
            "{header}\n*** START OF THE EBOOK ***\n{}\n*** END OF THE EBOOK ***\ntrailer trailer",
            numbered_words(120)
        );
        let words = tokenize(&text, Some(&Boundaries::GUTENBERG)).unwrap();
        assert_eq!(words.len(), 120);
        assert!(words.iter().all(|w| w.starts_with("word")));
    }

    #[test]
    fn short_text_is_rejected() {
        let err = tokenize(&numbered_words(99), None).unwrap_err();
        assert_eq!(err, GameError::InsufficientText { found: 99 });

        let err = tokenize("tiny", None).unwrap_err();
        assert_eq!(err, GameError::InsufficientText { found: 1 });
    }

    #[test]
    fn crlf_and_runs_of_whitespace_split_cleanly() {
        let text = numbered_words(100).replace(' ', "\r\n  \t");
        let words = tokenize(&text, None).unwrap();
        assert_eq!(words.len(), 100);
        assert!(words.iter().all(|w| !w.trim().is_empty() && w.trim() == w));
    }

    #[test]
    fn window_bounds_are_checked() {
        let words = tokenize(&numbered_words(100), None).unwrap();
        assert_eq!(words.window(0, 100).map(<[String]>::len), Some(100));
        assert!(words.window(1, 100).is_none());
        assert!(words.window(usize::MAX, 2).is_none());
    }
}
