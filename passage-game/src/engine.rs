//! Loader and storage seams plus the engine that drives a session through them.

use chrono::NaiveDate;
use once_cell::unsync::OnceCell;
use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::{BookRecord, Catalog};
use crate::constants::{KEY_HINTS_USED, KEY_WINNING_AUTHOR, KEY_WINNING_TITLE, KEY_WINNING_URL};
use crate::daily::DailyPassages;
use crate::distractors::ChoiceField;
use crate::error::GameError;
use crate::selector::MoreText;
use crate::session::{GameMode, GameSession, GuessAttempt, GuessOutcome, SessionView};

/// Trait for abstracting resource loading.
/// Platform-specific implementations should provide this
pub trait PassageSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the catalog CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog resource cannot be read.
    fn load_catalog(&self) -> Result<String, Self::Error>;

    /// Load the daily passages JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the daily resource cannot be read.
    fn load_daily(&self) -> Result<String, Self::Error>;

    /// Load the full text of one book by catalog filename.
    ///
    /// # Errors
    ///
    /// Returns an error if the book cannot be read.
    fn load_book_text(&self, filename: &str) -> Result<String, Self::Error>;
}

/// Trait for the string key/value store that carries results to the win screen.
pub trait ResultStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the value cannot be stored.
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;
}

/// What the results view shows after a win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub hints_used: u32,
    pub title: String,
    pub author: String,
    /// Book page; empty for daily passages.
    pub url: String,
}

impl WinRecord {
    /// Write every field under its result key.
    ///
    /// # Errors
    ///
    /// Returns the store's error if any write fails.
    pub fn persist<R: ResultStore + ?Sized>(&self, store: &R) -> Result<(), R::Error> {
        store.set_item(KEY_HINTS_USED, &self.hints_used.to_string())?;
        store.set_item(KEY_WINNING_TITLE, &self.title)?;
        store.set_item(KEY_WINNING_AUTHOR, &self.author)?;
        store.set_item(KEY_WINNING_URL, &self.url)
    }

    /// Read back the last win, if one was stored.
    ///
    /// # Errors
    ///
    /// Returns the store's error if any read fails.
    pub fn load<R: ResultStore + ?Sized>(store: &R) -> Result<Option<Self>, R::Error> {
        let Some(title) = store.get_item(KEY_WINNING_TITLE)? else {
            return Ok(None);
        };
        let hints_used = store
            .get_item(KEY_HINTS_USED)?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_default();
        Ok(Some(Self {
            hints_used,
            title,
            author: store.get_item(KEY_WINNING_AUTHOR)?.unwrap_or_default(),
            url: store.get_item(KEY_WINNING_URL)?.unwrap_or_default(),
        }))
    }
}

/// Main engine: loads resources once and routes player actions to a session.
pub struct GameEngine<S, R>
where
    S: PassageSource,
    R: ResultStore,
{
    source: S,
    store: R,
    catalog: OnceCell<Option<Catalog>>,
    daily: OnceCell<Option<DailyPassages>>,
}

impl<S, R> GameEngine<S, R>
where
    S: PassageSource,
    R: ResultStore,
{
    pub const fn new(source: S, store: R) -> Self {
        Self {
            source,
            store,
            catalog: OnceCell::new(),
            daily: OnceCell::new(),
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn store(&self) -> &R {
        &self.store
    }

    /// The book catalog, loaded on first use.
    ///
    /// # Errors
    ///
    /// The first failed load returns its own error; every later call returns
    /// `GameError::CatalogUnavailable` naming the resource, without retrying.
    pub fn catalog(&self) -> Result<&Catalog, GameError> {
        memoized(&self.catalog, "book catalog", || {
            let csv = self.source.load_catalog().map_err(fetch_error)?;
            Catalog::from_csv(&csv)
        })
    }

    /// The curated daily passages, loaded on first use.
    ///
    /// # Errors
    ///
    /// Same contract as [`GameEngine::catalog`].
    pub fn daily_passages(&self) -> Result<&DailyPassages, GameError> {
        memoized(&self.daily, "daily passages", || {
            let json = self.source.load_daily().map_err(fetch_error)?;
            DailyPassages::from_json(&json)
        })
    }

    /// Change modes, update the mode-dependent controls and load a passage.
    ///
    /// # Errors
    ///
    /// Returns the passage load error after it has been shown on `view`.
    pub fn switch_mode<V, G>(
        &self,
        session: &mut GameSession,
        mode: GameMode,
        view: &mut V,
        rng: &mut G,
        today: NaiveDate,
    ) -> Result<(), GameError>
    where
        V: SessionView + ?Sized,
        G: Rng + ?Sized,
    {
        session.set_mode(mode);
        view.set_daily_info_visible(mode.is_daily());
        view.set_more_text_enabled(!mode.is_daily());
        self.load_passage(session, view, rng, today)
    }

    /// Start a new round in the session's mode.
    ///
    /// Any failure clears the session and replaces the passage with an
    /// `Error loading passage: ...` message.
    ///
    /// # Errors
    ///
    /// Returns the same error that was shown on `view`.
    pub fn load_passage<V, G>(
        &self,
        session: &mut GameSession,
        view: &mut V,
        rng: &mut G,
        today: NaiveDate,
    ) -> Result<(), GameError>
    where
        V: SessionView + ?Sized,
        G: Rng + ?Sized,
    {
        let loaded = match session.mode() {
            GameMode::Daily => self
                .daily_passages()
                .and_then(|passages| session.begin_daily(passages, today).map(|_| ())),
            GameMode::FreePlay => self.begin_free_play(session, rng),
        };
        match loaded {
            Ok(()) => {
                session.render(view);
                Ok(())
            }
            Err(err) => {
                log::warn!("failed to load {} passage: {err}", session.mode());
                session.clear();
                view.show_error(&format!("Error loading passage: {err}"));
                view.show_hints_used(0);
                Err(err)
            }
        }
    }

    fn begin_free_play<G: Rng + ?Sized>(
        &self,
        session: &mut GameSession,
        rng: &mut G,
    ) -> Result<(), GameError> {
        let catalog = self.catalog()?;
        let filename = catalog
            .filenames()
            .choose(rng)
            .ok_or(GameError::EmptyCatalog {
                resource: "catalog",
            })?;
        let record = catalog.resolve(filename)?.clone();
        let text = self.source.load_book_text(filename).map_err(fetch_error)?;
        session.begin_free_play(record, &text, rng)?;
        Ok(())
    }

    /// Append another window of the current book.
    ///
    /// # Errors
    ///
    /// Returns `GameError::HintUnavailable` in daily mode or
    /// `GameError::NoActiveRound` before a passage is loaded.
    pub fn request_more_text<V, G>(
        &self,
        session: &mut GameSession,
        view: &mut V,
        rng: &mut G,
    ) -> Result<MoreText, GameError>
    where
        V: SessionView + ?Sized,
        G: Rng + ?Sized,
    {
        let more = session.request_more_text(rng)?;
        session.render(view);
        Ok(more)
    }

    /// Show multiple-choice options for one field.
    ///
    /// Free play draws distractors from the catalog, daily mode from the
    /// curated passages.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoActiveRound` without a passage, a load error for
    /// the pool, or `GameError::NotEnoughChoices`.
    pub fn request_choices<V, G>(
        &self,
        session: &mut GameSession,
        field: ChoiceField,
        view: &mut V,
        rng: &mut G,
    ) -> Result<Vec<String>, GameError>
    where
        V: SessionView + ?Sized,
        G: Rng + ?Sized,
    {
        if !session.has_round() {
            return Err(GameError::NoActiveRound);
        }
        let pool: Vec<BookRecord> = match session.mode() {
            GameMode::Daily => self.daily_passages()?.records(),
            GameMode::FreePlay => self.catalog()?.records().to_vec(),
        };
        let options = session.request_choices(field, &pool, rng)?.to_vec();
        view.show_choices(field, &options);
        view.show_hints_used(session.hints_used());
        Ok(options)
    }

    /// Judge a guess and store the result on a win.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoActiveRound` without a passage, or
    /// `GameError::RecordNotFound` if a free-play book has left the catalog.
    pub fn check_guess(
        &self,
        session: &mut GameSession,
        attempt: &GuessAttempt,
    ) -> Result<GuessOutcome, GameError> {
        if session.mode() == GameMode::FreePlay
            && let Some(source_id) = session.book().and_then(|b| b.source_id.as_deref())
        {
            self.catalog()?.resolve(source_id)?;
        }
        let outcome = session.submit_guess(attempt)?;
        if let GuessOutcome::Correct(win) = &outcome
            && let Err(err) = win.persist(&self.store)
        {
            log::warn!("could not store win for {}: {err}", win.title);
        }
        Ok(outcome)
    }

    /// The most recent stored win.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be read.
    pub fn last_win(&self) -> Result<Option<WinRecord>, R::Error> {
        WinRecord::load(&self.store)
    }
}

fn fetch_error(err: impl std::error::Error) -> GameError {
    GameError::Fetch(err.to_string())
}

fn memoized<'a, T>(
    cell: &'a OnceCell<Option<T>>,
    resource: &'static str,
    load: impl FnOnce() -> Result<T, GameError>,
) -> Result<&'a T, GameError> {
    let unavailable = GameError::CatalogUnavailable { resource };
    if let Some(cached) = cell.get() {
        return cached.as_ref().ok_or(unavailable);
    }
    let (value, first_error) = match load() {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err)),
    };
    match (cell.get_or_init(|| value).as_ref(), first_error) {
        (Some(value), _) => Ok(value),
        (None, Some(err)) => Err(err),
        (None, None) => Err(unavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::fmt;

    #[derive(Debug)]
    struct Missing(String);

    impl fmt::Display for Missing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} not found", self.0)
        }
    }

    impl std::error::Error for Missing {}

    #[derive(Default)]
    struct FixtureSource {
        catalog: Option<String>,
        daily: Option<String>,
        books: HashMap<String, String>,
        catalog_loads: Cell<usize>,
    }

    impl PassageSource for FixtureSource {
        type Error = Missing;

        fn load_catalog(&self) -> Result<String, Self::Error> {
            self.catalog_loads.set(self.catalog_loads.get() + 1);
            self.catalog.clone().ok_or_else(|| Missing("catalog".into()))
        }

        fn load_daily(&self) -> Result<String, Self::Error> {
            self.daily.clone().ok_or_else(|| Missing("daily".into()))
        }

        fn load_book_text(&self, filename: &str) -> Result<String, Self::Error> {
            self.books
                .get(filename)
                .cloned()
                .ok_or_else(|| Missing(filename.into()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        items: RefCell<HashMap<String, String>>,
    }

    impl ResultStore for MemoryStore {
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

    #[derive(Default)]
    struct RecordingView {
        passage: String,
        word_count: usize,
        hints: u32,
        errors: Vec<String>,
        more_text_enabled: Option<bool>,
        daily_info_visible: Option<bool>,
    }

    impl SessionView for RecordingView {
        fn show_passage(&mut self, text: &str, word_count: usize) {
            self.passage = text.to_string();
            self.word_count = word_count;
        }
        fn show_hints_used(&mut self, hints_used: u32) {
            self.hints = hints_used;
        }
        fn show_choices(&mut self, _field: ChoiceField, _options: &[String]) {}
        fn show_error(&mut self, message: &str) {
            self.passage = message.to_string();
            self.word_count = 0;
            self.errors.push(message.to_string());
        }
        fn set_more_text_enabled(&mut self, enabled: bool) {
            self.more_text_enabled = Some(enabled);
        }
        fn set_daily_info_visible(&mut self, visible: bool) {
            self.daily_info_visible = Some(visible);
        }
    }

    const CATALOG: &str = "filename,title,author,gutenberg_url
a.txt,Alpha,\"Ames, Ann\",https://example.org/a
b.txt,Beta,\"Boyd, Ben\",https://example.org/b
c.txt,Gamma,\"Cole, Cy\",https://example.org/c
d.txt,Delta,\"Dunn, Di\",https://example.org/d
";

    fn book(tag: &str) -> String {
        (0..150)
            .map(|n| format!("{tag}{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn source() -> FixtureSource {
        FixtureSource {
            catalog: Some(CATALOG.to_string()),
            daily: Some(
                r#"{"passages":[
                    {"book":"Emma","author":"Jane Austen","text":"Emma Woodhouse handsome clever and rich"},
                    {"book":"Dracula","author":"Bram Stoker","text":"3 May. Bistritz."},
                    {"book":"Beowulf","author":"Unknown","text":"Lo, praise of the prowess"},
                    {"book":"Middlemarch","author":"George Eliot","text":"Miss Brooke had that kind of beauty"}
                ]}"#
                .to_string(),
            ),
            books: ["a", "b", "c", "d"]
                .into_iter()
                .map(|tag| (format!("{tag}.txt"), book(tag)))
                .collect(),
            catalog_loads: Cell::new(0),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
    }

    #[test]
    fn free_play_round_to_win_persists_result() {
        let engine = GameEngine::new(source(), MemoryStore::default());
        let mut session = GameSession::default();
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        engine
            .switch_mode(&mut session, GameMode::FreePlay, &mut view, &mut rng, today())
            .unwrap();
        assert_eq!(view.more_text_enabled, Some(true));
        assert_eq!(view.daily_info_visible, Some(false));
        assert_eq!(view.word_count, 100);

        engine
            .request_more_text(&mut session, &mut view, &mut rng)
            .unwrap();
        assert_eq!(view.hints, 1);

        let answer = session.book().unwrap().clone();
        let outcome = engine
            .check_guess(&mut session, &GuessAttempt::new(&answer.title, &answer.author))
            .unwrap();
        assert!(outcome.is_correct());

        let win = engine.last_win().unwrap().unwrap();
        assert_eq!(win.hints_used, 1);
        assert_eq!(win.title, answer.title);
        assert_eq!(Some(win.url), answer.url);
    }

    #[test]
    fn catalog_is_loaded_once() {
        let engine = GameEngine::new(source(), MemoryStore::default());
        let mut session = GameSession::new(GameMode::FreePlay);
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..10 {
            engine
                .load_passage(&mut session, &mut view, &mut rng, today())
                .unwrap();
        }
        assert_eq!(engine.source().catalog_loads.get(), 1);
    }

    #[test]
    fn failed_catalog_is_not_retried() {
        let engine = GameEngine::new(
            FixtureSource {
                catalog: None,
                ..source()
            },
            MemoryStore::default(),
        );
        let mut session = GameSession::new(GameMode::FreePlay);
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let first = engine
            .load_passage(&mut session, &mut view, &mut rng, today())
            .unwrap_err();
        assert_eq!(first, GameError::Fetch("catalog not found".into()));
        assert_eq!(
            view.errors,
            vec!["Error loading passage: failed to fetch resource: catalog not found"]
        );

        let second = engine
            .load_passage(&mut session, &mut view, &mut rng, today())
            .unwrap_err();
        assert_eq!(
            second,
            GameError::CatalogUnavailable {
                resource: "book catalog"
            }
        );
        assert_eq!(engine.source().catalog_loads.get(), 1);
        assert!(!session.has_round());
    }

    #[test]
    fn failed_daily_load_names_daily_passages() {
        let engine = GameEngine::new(
            FixtureSource {
                daily: None,
                ..source()
            },
            MemoryStore::default(),
        );
        let mut session = GameSession::new(GameMode::Daily);
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        assert!(matches!(
            engine.load_passage(&mut session, &mut view, &mut rng, today()),
            Err(GameError::Fetch(_))
        ));
        let second = engine
            .load_passage(&mut session, &mut view, &mut rng, today())
            .unwrap_err();
        assert_eq!(
            second,
            GameError::CatalogUnavailable {
                resource: "daily passages"
            }
        );
        assert_eq!(
            view.errors.last().map(String::as_str),
            Some("Error loading passage: daily passages is unavailable")
        );
        assert!(engine.catalog().is_ok());
    }

    #[test]
    fn missing_book_shows_error_and_clears_session() {
        let engine = GameEngine::new(
            FixtureSource {
                books: HashMap::new(),
                ..source()
            },
            MemoryStore::default(),
        );
        let mut session = GameSession::new(GameMode::FreePlay);
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let err = engine
            .load_passage(&mut session, &mut view, &mut rng, today())
            .unwrap_err();
        assert!(matches!(err, GameError::Fetch(_)));
        assert!(view.passage.starts_with("Error loading passage: "));
        assert_eq!(view.word_count, 0);
        assert_eq!(session.word_count(), 0);
    }

    #[test]
    fn daily_mode_uses_daily_pool_for_choices() {
        let engine = GameEngine::new(source(), MemoryStore::default());
        let mut session = GameSession::default();
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        engine
            .switch_mode(&mut session, GameMode::Daily, &mut view, &mut rng, today())
            .unwrap();
        assert_eq!(view.daily_info_visible, Some(true));
        assert_eq!(view.more_text_enabled, Some(false));
        // 2024-01-03 is day 2 of the rotation.
        assert_eq!(session.book().unwrap().title, "Beowulf");
        assert_eq!(view.passage, "Lo, praise of the prowess");

        let titles = engine
            .request_choices(&mut session, ChoiceField::Title, &mut view, &mut rng)
            .unwrap();
        let mut sorted = titles.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["Beowulf", "Dracula", "Emma", "Middlemarch"]);
        assert_eq!(engine.source().catalog_loads.get(), 0);

        assert_eq!(
            engine.request_more_text(&mut session, &mut view, &mut rng),
            Err(GameError::HintUnavailable {
                mode: GameMode::Daily
            })
        );

        let outcome = engine
            .check_guess(&mut session, &GuessAttempt::new("beowulf", "unknown"))
            .unwrap();
        assert!(outcome.is_correct());
        assert_eq!(engine.last_win().unwrap().unwrap().url, "");
    }

    #[test]
    fn win_record_round_trips_through_store() {
        let store = MemoryStore::default();
        assert_eq!(WinRecord::load(&store).unwrap(), None);
        let win = WinRecord {
            hints_used: 3,
            title: "Middlemarch".into(),
            author: "George Eliot".into(),
            url: String::new(),
        };
        win.persist(&store).unwrap();
        assert_eq!(
            store.get_item("arrowsUsed").unwrap().as_deref(),
            Some("3")
        );
        assert_eq!(WinRecord::load(&store).unwrap(), Some(win));
    }

    #[test]
    fn choices_without_round_are_rejected() {
        let engine = GameEngine::new(source(), MemoryStore::default());
        let mut session = GameSession::new(GameMode::FreePlay);
        let mut view = RecordingView::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            engine.request_choices(&mut session, ChoiceField::Author, &mut view, &mut rng),
            Err(GameError::NoActiveRound)
        );
    }
}
