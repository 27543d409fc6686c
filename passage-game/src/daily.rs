//! Passage-of-the-day rotation.
//!
//! Every calendar day maps to one curated passage. The index only depends on
//! the date, so the same passage is shown all day whatever the hour.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::catalog::BookRecord;
use crate::constants::{DAILY_EPOCH_DAY, DAILY_EPOCH_MONTH, DAILY_EPOCH_YEAR};
use crate::error::GameError;

/// A curated passage with its answer embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPassage {
    pub book: String,
    pub author: String,
    pub text: String,
}

impl DailyPassage {
    /// Answer record for this passage. Daily passages have no source file or URL.
    #[must_use]
    pub fn record(&self) -> BookRecord {
        BookRecord::new(&self.book, &self.author)
    }
}

/// Ordered list of curated passages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyPassages {
    pub passages: Vec<DailyPassage>,
}

impl DailyPassages {
    /// Parse the daily passages resource.
    ///
    /// # Errors
    ///
    /// Returns `GameError::MalformedResource` if the JSON does not have the
    /// expected shape, or `GameError::EmptyCatalog` if it holds no passages.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let parsed: Self = serde_json::from_str(json)
            .map_err(|err| GameError::malformed("daily passages", err.to_string()))?;
        if parsed.passages.is_empty() {
            return Err(GameError::EmptyCatalog {
                resource: "daily passages",
            });
        }
        Ok(parsed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// The passage scheduled for `today`.
    #[must_use]
    pub fn for_date(&self, today: NaiveDate) -> Option<&DailyPassage> {
        let index = daily_index(today, self.passages.len())?;
        log::debug!("daily passage index {index} for {today}");
        self.passages.get(index)
    }

    /// Answer records of every passage, used as the distractor pool.
    #[must_use]
    pub fn records(&self) -> Vec<BookRecord> {
        self.passages.iter().map(DailyPassage::record).collect()
    }
}

#[must_use]
pub fn daily_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(DAILY_EPOCH_YEAR, DAILY_EPOCH_MONTH, DAILY_EPOCH_DAY)
        .unwrap_or(NaiveDate::MIN)
}

/// Whole calendar days from the epoch to `today`; negative before the epoch.
#[must_use]
pub fn days_since_epoch(today: NaiveDate) -> i64 {
    today.signed_duration_since(daily_epoch()).num_days()
}

/// Index of the passage for `today` in a rotation of `size` passages.
#[must_use]
pub fn daily_index(today: NaiveDate, size: usize) -> Option<usize> {
    let size = i64::try_from(size).ok().filter(|s| *s > 0)?;
    usize::try_from(days_since_epoch(today).rem_euclid(size)).ok()
}

/// Time left until the rotation moves to the next passage.
#[must_use]
pub fn time_until_next_daily(now: NaiveDateTime) -> Duration {
    let next_midnight = now
        .date()
        .succ_opt()
        .map_or(NaiveDateTime::MAX, |day| day.and_time(NaiveTime::MIN));
    next_midnight.signed_duration_since(now)
}

/// Render a countdown as `HH:MM:SS`.
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
