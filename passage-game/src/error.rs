use thiserror::Error;

use crate::distractors::ChoiceField;
use crate::session::GameMode;

/// Errors raised while loading, selecting or judging a passage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("text has fewer than 100 usable words (found {found})")]
    InsufficientText { found: usize },
    #[error("no catalog entry for {source_id}")]
    RecordNotFound { source_id: String },
    #[error("failed to fetch resource: {0}")]
    Fetch(String),
    #[error("{resource} is malformed: {reason}")]
    MalformedResource {
        resource: &'static str,
        reason: String,
    },
    #[error("{resource} is unavailable")]
    CatalogUnavailable { resource: &'static str },
    #[error("{resource} has no entries")]
    EmptyCatalog { resource: &'static str },
    #[error("need at least 4 distinct {field} options (found {distinct})")]
    NotEnoughChoices { field: ChoiceField, distinct: usize },
    #[error("more text is not available in {mode} mode")]
    HintUnavailable { mode: GameMode },
    #[error("no passage is loaded")]
    NoActiveRound,
}

impl GameError {
    pub(crate) fn malformed(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResource {
            resource,
            reason: reason.into(),
        }
    }
}
