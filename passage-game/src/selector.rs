//! Fixed-size passage windows over a word sequence.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{MORE_TEXT_SEPARATOR, PASSAGE_WORDS};
use crate::error::GameError;
use crate::tokenizer::WordSequence;

/// The words shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub word_count: usize,
    /// Offset of the window in its word sequence; `None` for curated text.
    pub start: Option<usize>,
}

impl Passage {
    /// Wrap pre-built text, such as a curated daily passage.
    #[must_use]
    pub fn curated(text: &str) -> Self {
        Self {
            text: text.to_string(),
            word_count: count_words(text),
            start: None,
        }
    }
}

/// Result of a "more text" hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreText {
    /// Full display text including the separator and the new window.
    pub text: String,
    /// Words in the appended window only.
    pub word_count: usize,
    pub window: Passage,
}

#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Select the 100-word window starting at `start`.
///
/// # Errors
///
/// Returns `GameError::InsufficientText` if the window would run past the end
/// of the sequence.
pub fn select_at(words: &WordSequence, start: usize) -> Result<Passage, GameError> {
    let window = words
        .window(start, PASSAGE_WORDS)
        .ok_or(GameError::InsufficientText { found: words.len() })?;
    Ok(Passage {
        text: window.join(" "),
        word_count: window.len(),
        start: Some(start),
    })
}

/// Select a uniformly random 100-word window.
///
/// # Errors
///
/// Returns `GameError::InsufficientText` if the sequence is shorter than a
/// full window.
pub fn select_random<R: Rng + ?Sized>(
    words: &WordSequence,
    rng: &mut R,
) -> Result<Passage, GameError> {
    if words.len() < PASSAGE_WORDS {
        return Err(GameError::InsufficientText { found: words.len() });
    }
    let max_start = words.len() - PASSAGE_WORDS;
    let start = rng.gen_range(0..=max_start);
    log::debug!("selected window {start}..{} of {}", start + PASSAGE_WORDS, words.len());
    select_at(words, start)
}

/// Append an independent random window to the displayed text.
///
/// The new window is not contiguous with what is already shown.
///
/// # Errors
///
/// Returns `GameError::InsufficientText` if the sequence is shorter than a
/// full window.
pub fn extend_with_random_window<R: Rng + ?Sized>(
    displayed: &str,
    words: &WordSequence,
    rng: &mut R,
) -> Result<MoreText, GameError> {
    let window = select_random(words, rng)?;
    let mut text = String::with_capacity(displayed.len() + window.text.len() + 8);
    text.push_str(displayed);
    if !displayed.is_empty() {
        text.push_str(MORE_TEXT_SEPARATOR);
    }
    text.push_str(&window.text);
    Ok(MoreText {
        text,
        word_count: window.word_count,
        window,
    })
}
