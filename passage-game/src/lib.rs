//! Passage Guess Engine
//!
//! Platform-agnostic core of the "guess the book passage" game: text cleaning,
//! passage selection, answer lookup, multiple-choice hints and fuzzy guess
//! matching. Resource loading, result storage and rendering stay behind the
//! traits in [`engine`] and [`session`].

pub mod catalog;
pub mod constants;
pub mod daily;
pub mod distractors;
pub mod engine;
pub mod error;
pub mod filename;
pub mod matcher;
pub mod normalize;
pub mod selector;
pub mod session;
pub mod tokenizer;

// Re-export commonly used types
pub use catalog::{BookRecord, Catalog};
pub use daily::{
    DailyPassage, DailyPassages, daily_index, days_since_epoch, format_countdown,
    time_until_next_daily,
};
pub use distractors::{ChoiceField, MultipleChoice, pick_options};
pub use engine::{GameEngine, PassageSource, ResultStore, WinRecord};
pub use error::GameError;
pub use filename::{clean_author_token, parse_book_filename};
pub use matcher::{is_match, levenshtein, similarity};
pub use normalize::normalize;
pub use selector::{MoreText, Passage, extend_with_random_window, select_at, select_random};
pub use session::{
    GameMode, GameSession, GuessAttempt, GuessOutcome, RoundPhase, SessionView,
};
pub use tokenizer::{Boundaries, WordSequence, tokenize};
