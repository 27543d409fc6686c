//! Multiple-choice hints.
//!
//! Each option set holds the correct value and three other values drawn from
//! the pool, in random order.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::catalog::BookRecord;
use crate::constants::CHOICE_COUNT;
use crate::error::GameError;

/// Which half of the answer a choice list is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceField {
    Title,
    Author,
}

impl ChoiceField {
    /// The value of this field on `record`.
    #[must_use]
    pub fn of(self, record: &BookRecord) -> &str {
        match self {
            Self::Title => &record.title,
            Self::Author => &record.author,
        }
    }
}

impl fmt::Display for ChoiceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Author => f.write_str("author"),
        }
    }
}

/// The correct value plus three distinct distractors, shuffled.
///
/// # Errors
///
/// Returns `GameError::NotEnoughChoices` when `pool` and `correct` together
/// hold fewer than four distinct values.
pub fn pick_options<R: Rng + ?Sized>(
    field: ChoiceField,
    correct: &str,
    pool: &[&str],
    rng: &mut R,
) -> Result<Vec<String>, GameError> {
    let distinct: HashSet<&str> = pool.iter().copied().chain([correct]).collect();
    if distinct.len() < CHOICE_COUNT {
        return Err(GameError::NotEnoughChoices {
            field,
            distinct: distinct.len(),
        });
    }

    let mut options = vec![correct.to_string()];
    while options.len() < CHOICE_COUNT {
        let Some(candidate) = pool.choose(rng) else {
            break;
        };
        if !options.iter().any(|o| o == candidate) {
            options.push((*candidate).to_string());
        }
    }
    options.shuffle(rng);
    Ok(options)
}

/// Title and author option sets for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoice {
    pub titles: Vec<String>,
    pub authors: Vec<String>,
}

impl MultipleChoice {
    /// Build both option sets from a pool of records.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NotEnoughChoices` for the first field whose pool is
    /// too small.
    pub fn build<R: Rng + ?Sized>(
        correct: &BookRecord,
        pool: &[BookRecord],
        rng: &mut R,
    ) -> Result<Self, GameError> {
        Ok(Self {
            titles: options_for(ChoiceField::Title, correct, pool, rng)?,
            authors: options_for(ChoiceField::Author, correct, pool, rng)?,
        })
    }

    #[must_use]
    pub fn field(&self, field: ChoiceField) -> &[String] {
        match field {
            ChoiceField::Title => &self.titles,
            ChoiceField::Author => &self.authors,
        }
    }
}

/// Option set for one field of `correct`.
///
/// # Errors
///
/// Returns `GameError::NotEnoughChoices` when the pool is too small.
pub fn options_for<R: Rng + ?Sized>(
    field: ChoiceField,
    correct: &BookRecord,
    pool: &[BookRecord],
    rng: &mut R,
) -> Result<Vec<String>, GameError> {
    let values: Vec<&str> = pool.iter().map(|record| field.of(record)).collect();
    pick_options(field, field.of(correct), &values, rng)
}
