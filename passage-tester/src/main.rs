mod assets;
mod reports;
mod scenarios;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use assets::FsPassageSource;
use scenarios::{ScenarioCtx, ScenarioResult, ScenarioRunner, get_scenario, list_scenarios};
use util::{parse_seeds, resolve_date, split_csv};

#[derive(Debug, Parser)]
#[command(name = "passage-tester", version)]
#[command(about = "Automated QA for Passage Guess - catalog audits, daily rotation and seeded self-play")]
struct Args {
    /// Asset directory holding the catalog CSV, daily passages and books/
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Day to treat as today for daily mode (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    let ctx = ScenarioCtx {
        source: FsPassageSource::new(
            args.assets
                .clone()
                .unwrap_or_else(FsPassageSource::default_root),
        ),
        today: resolve_date(args.date.as_deref())?,
        verbose: args.verbose,
    };
    log::info!(
        "running against {} for {}",
        ctx.source.root().display(),
        ctx.today
    );

    let results = run_scenarios(&args, &ctx, &seeds);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "📖 Passage Guess Automated Tester".bright_cyan().bold());
    println!("{}", "=================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_scenarios(args: &Args, ctx: &ScenarioCtx, seeds: &[u64]) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let runner = ScenarioRunner::new(args.verbose);
    let mut results = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        if let Some(scenario) = get_scenario(&name) {
            results.extend(runner.run_scenario(scenario, ctx, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
        }
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(output_target.writer(), results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    output_target.writer(),
                    "# Passage Guess Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                reports::generate_markdown_report(output_target.writer(), results)?;
            }
        }
        _ => {
            reports::generate_console_report(
                output_target.writer(),
                results,
                start_time.elapsed(),
            )?;
            writeln!(output_target.writer())?;
            writeln!(
                output_target.writer(),
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
