//! Named QA scenarios run against an asset directory.
//!
//! Every scenario builds a fresh engine over the filesystem source, so no
//! memoized catalog or stored win leaks from one iteration to the next.

use anyhow::{Context, Result, bail, ensure};
use chrono::{Duration as DateDelta, NaiveDate};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::assets::{FsPassageSource, MemoryResultStore, TranscriptView};
use passage_game::constants::{CHOICE_COUNT, MORE_TEXT_SEPARATOR, PASSAGE_WORDS};
use passage_game::filename::{book_filename, extract_ebook_id};
use passage_game::{
    Boundaries, Catalog, ChoiceField, GameEngine, GameError, GameMode, GameSession, GuessAttempt,
    GuessOutcome, PassageSource, daily_index, format_countdown, is_match, parse_book_filename,
    time_until_next_daily, tokenize,
};

type Engine = GameEngine<FsPassageSource, MemoryResultStore>;

pub struct ScenarioCtx {
    pub source: FsPassageSource,
    pub today: NaiveDate,
    pub verbose: bool,
}

impl ScenarioCtx {
    fn engine(&self) -> Engine {
        GameEngine::new(self.source.clone(), MemoryResultStore::default())
    }
}

pub struct TestScenario {
    pub key: &'static str,
    pub description: &'static str,
    pub check: fn(&ScenarioCtx, &mut ChaCha8Rng) -> Result<()>,
}

const SCENARIOS: &[TestScenario] = &[
    TestScenario {
        key: "smoke",
        description: "Load a free-play round, use a hint, win it, then switch to daily mode",
        check: smoke,
    },
    TestScenario {
        key: "catalog-audit",
        description: "Every catalog book exists, tokenizes and matches its filename",
        check: catalog_audit,
    },
    TestScenario {
        key: "daily-rotation",
        description: "Daily passages rotate once per day and cover the whole list",
        check: daily_rotation,
    },
    TestScenario {
        key: "self-play",
        description: "Win free-play rounds through multiple choice and typo-tolerant guesses",
        check: self_play,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.description))
}

pub fn get_scenario(name: &str) -> Option<&'static TestScenario> {
    let name = name.to_lowercase();
    SCENARIOS.iter().find(|s| s.key == name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        ctx: &ScenarioCtx,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key.bright_white()
                    );
                }
                self.run_single_scenario(scenario, ctx, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        ctx: &ScenarioCtx,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let mut rng = ChaCha8Rng::seed_from_u64(iteration_seed);
            let start = Instant::now();
            match (scenario.check)(ctx, &mut rng) {
                Ok(()) => {
                    successes += 1;
                    let elapsed = start.elapsed();
                    durations.push(elapsed);
                    if self.verbose {
                        println!("  ✅ Iteration {}/{iterations} passed ({elapsed:?})", i + 1);
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
        }
    }
}

fn smoke(ctx: &ScenarioCtx, rng: &mut ChaCha8Rng) -> Result<()> {
    let engine = ctx.engine();
    let mut session = GameSession::default();
    let mut view = TranscriptView::default();

    engine
        .switch_mode(&mut session, GameMode::FreePlay, &mut view, rng, ctx.today)
        .context("loading a free-play passage")?;
    ensure!(view.more_text_enabled, "more text should be enabled in free play");
    ensure!(
        view.word_count == PASSAGE_WORDS,
        "expected {PASSAGE_WORDS} words, saw {}",
        view.word_count
    );
    let answer = session
        .book()
        .cloned()
        .context("free-play round has no answer")?;

    engine.request_more_text(&mut session, &mut view, rng)?;
    ensure!(view.hints_used == 1, "hint counter shows {}", view.hints_used);
    ensure!(
        view.passage.contains(MORE_TEXT_SEPARATOR),
        "extra text was not separated from the passage"
    );

    let miss = engine.check_guess(&mut session, &GuessAttempt::new("Zzyzx Road", "Nobody"))?;
    ensure!(!miss.is_correct(), "nonsense guess was accepted");

    let hit = engine.check_guess(
        &mut session,
        &GuessAttempt::new(&answer.title, &answer.author),
    )?;
    ensure!(hit.is_correct(), "exact answer rejected: {}", hit.message());
    let win = engine
        .last_win()?
        .context("win was not stored for the results view")?;
    ensure!(win.hints_used == 1, "stored {} hints", win.hints_used);
    ensure!(
        Some(&win.url) == answer.url.as_ref(),
        "stored url {:?} does not match {:?}",
        win.url,
        answer.url
    );

    engine
        .switch_mode(&mut session, GameMode::Daily, &mut view, rng, ctx.today)
        .context("loading the daily passage")?;
    ensure!(view.daily_info_visible, "daily info hidden in daily mode");
    ensure!(!view.more_text_enabled, "more text enabled in daily mode");
    ensure!(
        matches!(
            engine.request_more_text(&mut session, &mut view, rng),
            Err(GameError::HintUnavailable { .. })
        ),
        "daily mode allowed more text"
    );
    ensure!(view.errors.is_empty(), "view showed errors: {:?}", view.errors);
    Ok(())
}

fn catalog_audit(ctx: &ScenarioCtx, _rng: &mut ChaCha8Rng) -> Result<()> {
    let engine = ctx.engine();
    let catalog = engine
        .catalog()
        .with_context(|| format!("loading catalog from {}", ctx.source.root().display()))?;

    let titles: HashSet<&str> = catalog.records().iter().map(|r| r.title.as_str()).collect();
    let authors: HashSet<&str> = catalog.records().iter().map(|r| r.author.as_str()).collect();
    ensure!(
        titles.len() >= CHOICE_COUNT && authors.len() >= CHOICE_COUNT,
        "catalog needs {CHOICE_COUNT} distinct titles and authors, has {} and {}",
        titles.len(),
        authors.len()
    );

    let mut problems = Vec::new();
    for record in catalog.records() {
        let Some(filename) = record.source_id.as_deref() else {
            problems.push(format!("{} has no filename", record.title));
            continue;
        };
        match engine.source().load_book_text(filename) {
            Ok(text) => {
                if let Err(err) = tokenize(&text, Some(&Boundaries::GUTENBERG)) {
                    problems.push(format!("{filename}: {err}"));
                }
            }
            Err(err) => problems.push(format!("{filename}: {err}")),
        }

        let parsed = parse_book_filename(filename);
        if !is_match(&parsed.title, &record.title) || !is_match(&parsed.author, &record.author) {
            problems.push(format!(
                "{filename} reads as {:?} by {:?}, catalog says {:?} by {:?}",
                parsed.title, parsed.author, record.title, record.author
            ));
        }
        let expected = book_filename(&record.title, &record.author);
        if expected != filename {
            problems.push(format!("{filename} should be named {expected}"));
        }
        if let (Some(url), Some(id)) = (record.url.as_deref(), record.ebook_id.as_deref())
            && extract_ebook_id(url).as_deref() != Some(id)
        {
            problems.push(format!("{filename}: ebook id {id} does not match {url}"));
        }
    }

    let reparsed = Catalog::from_csv(&catalog.to_csv()?)?;
    if &reparsed != catalog {
        problems.push("catalog changes when written and read back".to_string());
    }

    if !problems.is_empty() {
        bail!("{}", problems.join("; "));
    }
    if ctx.verbose {
        println!("  📚 {} catalog books audited", catalog.len());
    }
    Ok(())
}

fn daily_rotation(ctx: &ScenarioCtx, rng: &mut ChaCha8Rng) -> Result<()> {
    let engine = ctx.engine();
    let passages = engine.daily_passages()?;
    let size = passages.len();
    let mut session = GameSession::new(GameMode::Daily);
    let mut view = TranscriptView::default();
    let mut seen = HashSet::new();

    for offset in 0..size {
        let day = ctx.today + DateDelta::days(i64::try_from(offset)?);
        let index = daily_index(day, size).context("empty rotation")?;
        let expected = passages.for_date(day).context("no passage scheduled")?;

        engine.load_passage(&mut session, &mut view, rng, day)?;
        let shown = view.passage.clone();
        engine.load_passage(&mut session, &mut view, rng, day)?;
        ensure!(view.passage == shown, "{day} showed two different passages");
        ensure!(shown == expected.text, "{day} did not show passage {index}");
        ensure!(session.hints_used() == 0, "{day} kept hints from a previous round");

        let title = session.book().map(|b| b.title.clone()).unwrap_or_default();
        let titles = engine.request_choices(&mut session, ChoiceField::Title, &mut view, rng)?;
        ensure!(
            titles.len() == CHOICE_COUNT && titles.contains(&title),
            "{day} title choices {titles:?} miss {title:?}"
        );
        seen.insert(index);
    }
    ensure!(
        seen.len() == size,
        "{size} consecutive days covered only {} passages",
        seen.len()
    );

    let midday = ctx
        .today
        .and_hms_opt(12, 0, 0)
        .context("invalid time of day")?;
    let countdown = format_countdown(time_until_next_daily(midday));
    ensure!(countdown == "12:00:00", "countdown at noon was {countdown}");
    Ok(())
}

fn self_play(ctx: &ScenarioCtx, rng: &mut ChaCha8Rng) -> Result<()> {
    let engine = ctx.engine();
    let mut session = GameSession::new(GameMode::FreePlay);
    let mut view = TranscriptView::default();

    engine.load_passage(&mut session, &mut view, rng, ctx.today)?;
    let titles = engine.request_choices(&mut session, ChoiceField::Title, &mut view, rng)?;
    let authors = engine.request_choices(&mut session, ChoiceField::Author, &mut view, rng)?;
    ensure!(
        view.title_choices == titles && view.author_choices == authors,
        "view shows different choices than were offered"
    );

    let mut guesses = 0;
    let mut won = false;
    'search: for title in &titles {
        for author in &authors {
            guesses += 1;
            if engine
                .check_guess(&mut session, &GuessAttempt::new(title, author))?
                .is_correct()
            {
                won = true;
                break 'search;
            }
        }
    }
    ensure!(won, "no combination of the offered choices won");
    ensure!(
        guesses <= CHOICE_COUNT * CHOICE_COUNT,
        "took {guesses} guesses"
    );
    let win = engine.last_win()?.context("win was not stored")?;
    ensure!(win.hints_used == 2, "stored {} hints, expected 2", win.hints_used);
    ensure!(
        engine.check_guess(&mut session, &GuessAttempt::new("", ""))? == GuessOutcome::AlreadyWon,
        "solved round accepted another guess"
    );

    // Second round: one typo in the title, surname only for the author.
    engine.load_passage(&mut session, &mut view, rng, ctx.today)?;
    let answer = session.book().cloned().context("no second round")?;
    let surname = answer
        .author
        .split_once(',')
        .map_or(answer.author.as_str(), |(last, _)| last);
    let outcome = engine.check_guess(
        &mut session,
        &GuessAttempt::new(&with_typo(&answer.title), surname),
    )?;
    ensure!(
        outcome.is_correct(),
        "typo guess for {:?} by {:?} rejected: {}",
        answer.title,
        answer.author,
        outcome.message()
    );
    Ok(())
}

/// Replace the middle letter of `text` with a different letter.
fn with_typo(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let letters: Vec<usize> = (0..chars.len())
        .filter(|&i| chars[i].is_alphabetic())
        .collect();
    if let Some(&i) = letters.get(letters.len() / 2) {
        chars[i] = if chars[i].eq_ignore_ascii_case(&'x') { 'z' } else { 'x' };
    }
    chars.into_iter().collect()
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
