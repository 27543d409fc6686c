//! Per-round game state.
//!
//! A session moves from `AwaitingGuess` to `Won` once both halves of a guess
//! match; wrong guesses leave it waiting. Starting a new passage always
//! resets every counter, and a failed start leaves the session empty.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::BookRecord;
use crate::daily::DailyPassages;
use crate::distractors::{ChoiceField, options_for};
use crate::engine::WinRecord;
use crate::error::GameError;
use crate::matcher::is_match;
use crate::selector::{MoreText, Passage, extend_with_random_window, select_random};
use crate::tokenizer::{Boundaries, WordSequence, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    #[default]
    Daily,
    FreePlay,
}

impl GameMode {
    #[must_use]
    pub const fn is_daily(self) -> bool {
        matches!(self, Self::Daily)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::FreePlay => f.write_str("free-play"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    #[default]
    AwaitingGuess,
    Won,
}

/// A player's title and author guess.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessAttempt {
    pub title: String,
    pub author: String,
}

impl GuessAttempt {
    #[must_use]
    pub fn new(title: &str, author: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            author: author.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct(WinRecord),
    Incorrect { title_ok: bool, author_ok: bool },
    AlreadyWon,
}

impl GuessOutcome {
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        matches!(self, Self::Correct(_))
    }

    /// Result line shown under the guess form.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Correct(win) => format!(
                "CORRECT! This passage was from \"{}\" by {}",
                win.title, win.author
            ),
            Self::Incorrect {
                title_ok: false,
                author_ok: false,
            } => "INCORRECT. Both title and author are wrong.".to_string(),
            Self::Incorrect {
                title_ok: false, ..
            } => "INCORRECT. The title is wrong.".to_string(),
            Self::Incorrect { .. } => "INCORRECT. The author is wrong.".to_string(),
            Self::AlreadyWon => "You already solved this passage.".to_string(),
        }
    }
}

/// Presentation hooks the engine drives.
///
/// Implementations render however they like; the engine never reads back
/// from the view.
pub trait SessionView {
    fn show_passage(&mut self, text: &str, word_count: usize);
    fn show_hints_used(&mut self, hints_used: u32);
    fn show_choices(&mut self, field: ChoiceField, options: &[String]);
    fn show_error(&mut self, message: &str);
    fn set_more_text_enabled(&mut self, enabled: bool);
    fn set_daily_info_visible(&mut self, visible: bool);
}

#[derive(Debug, Clone, Default)]
pub struct GameSession {
    mode: GameMode,
    phase: RoundPhase,
    book: Option<BookRecord>,
    passage: Option<Passage>,
    words: Option<WordSequence>,
    displayed_text: String,
    word_count: usize,
    hints_used: u32,
    title_choices: Option<Vec<String>>,
    author_choices: Option<Vec<String>>,
}

impl GameSession {
    #[must_use]
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub const fn book(&self) -> Option<&BookRecord> {
        self.book.as_ref()
    }

    #[must_use]
    pub const fn passage(&self) -> Option<&Passage> {
        self.passage.as_ref()
    }

    #[must_use]
    pub const fn words(&self) -> Option<&WordSequence> {
        self.words.as_ref()
    }

    #[must_use]
    pub fn displayed_text(&self) -> &str {
        &self.displayed_text
    }

    /// Words in the most recently shown window.
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.word_count
    }

    #[must_use]
    pub const fn hints_used(&self) -> u32 {
        self.hints_used
    }

    #[must_use]
    pub fn choices(&self, field: ChoiceField) -> Option<&[String]> {
        match field {
            ChoiceField::Title => self.title_choices.as_deref(),
            ChoiceField::Author => self.author_choices.as_deref(),
        }
    }

    #[must_use]
    pub const fn has_round(&self) -> bool {
        self.book.is_some()
    }

    /// Drop the current round and switch modes.
    pub fn set_mode(&mut self, mode: GameMode) {
        self.clear();
        self.mode = mode;
    }

    /// Forget the current round, keeping the mode.
    pub fn clear(&mut self) {
        *self = Self::new(self.mode);
    }

    /// Start the passage scheduled for `today`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::EmptyCatalog` if no passage is scheduled.
    pub fn begin_daily(
        &mut self,
        passages: &DailyPassages,
        today: NaiveDate,
    ) -> Result<&Passage, GameError> {
        self.set_mode(GameMode::Daily);
        let todays = passages.for_date(today).ok_or(GameError::EmptyCatalog {
            resource: "daily passages",
        })?;
        let passage = Passage::curated(&todays.text);
        self.book = Some(todays.record());
        self.displayed_text.clone_from(&passage.text);
        self.word_count = passage.word_count;
        Ok(&*self.passage.insert(passage))
    }

    /// Start a free-play round on a random window of `text`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InsufficientText` if the book has fewer than 100
    /// usable words.
    pub fn begin_free_play<R: Rng + ?Sized>(
        &mut self,
        record: BookRecord,
        text: &str,
        rng: &mut R,
    ) -> Result<&Passage, GameError> {
        self.set_mode(GameMode::FreePlay);
        let words = tokenize(text, Some(&Boundaries::GUTENBERG))?;
        let passage = select_random(&words, rng)?;
        log::debug!(
            "free play: {} by {} ({} usable words)",
            record.title,
            record.author,
            words.len()
        );
        self.book = Some(record);
        self.words = Some(words);
        self.displayed_text.clone_from(&passage.text);
        self.word_count = passage.word_count;
        Ok(&*self.passage.insert(passage))
    }

    /// Append another random window. Costs one hint.
    ///
    /// # Errors
    ///
    /// Returns `GameError::HintUnavailable` in daily mode and
    /// `GameError::NoActiveRound` before a free-play passage is loaded.
    pub fn request_more_text<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<MoreText, GameError> {
        if self.mode.is_daily() {
            return Err(GameError::HintUnavailable { mode: self.mode });
        }
        let words = self.words.as_ref().ok_or(GameError::NoActiveRound)?;
        let more = extend_with_random_window(&self.displayed_text, words, rng)?;
        self.displayed_text.clone_from(&more.text);
        self.word_count = more.word_count;
        self.hints_used += 1;
        Ok(more)
    }

    /// Show multiple-choice options for one field. Costs one hint.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoActiveRound` without a passage, or
    /// `GameError::NotEnoughChoices` if `pool` is too small.
    pub fn request_choices<R: Rng + ?Sized>(
        &mut self,
        field: ChoiceField,
        pool: &[BookRecord],
        rng: &mut R,
    ) -> Result<&[String], GameError> {
        let book = self.book.as_ref().ok_or(GameError::NoActiveRound)?;
        let options = options_for(field, book, pool, rng)?;
        self.hints_used += 1;
        let slot = match field {
            ChoiceField::Title => &mut self.title_choices,
            ChoiceField::Author => &mut self.author_choices,
        };
        Ok(slot.insert(options).as_slice())
    }

    /// Judge a guess against the current answer.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoActiveRound` if no passage is loaded.
    pub fn submit_guess(&mut self, attempt: &GuessAttempt) -> Result<GuessOutcome, GameError> {
        let book = self.book.as_ref().ok_or(GameError::NoActiveRound)?;
        if self.phase == RoundPhase::Won {
            return Ok(GuessOutcome::AlreadyWon);
        }
        let title_ok = is_match(&attempt.title, &book.title);
        let author_ok = is_match(&attempt.author, &book.author);
        if !(title_ok && author_ok) {
            return Ok(GuessOutcome::Incorrect {
                title_ok,
                author_ok,
            });
        }

        self.phase = RoundPhase::Won;
        let win = WinRecord {
            hints_used: self.hints_used,
            title: book.title.clone(),
            author: book.author.clone(),
            url: book.url.clone().unwrap_or_default(),
        };
        log::info!(
            "solved {} by {} with {} hints",
            win.title,
            win.author,
            win.hints_used
        );
        Ok(GuessOutcome::Correct(win))
    }

    /// Push the current passage and hint count to `view`.
    pub fn render<V: SessionView + ?Sized>(&self, view: &mut V) {
        view.show_passage(&self.displayed_text, self.word_count);
        view.show_hints_used(self.hints_used);
    }
}
