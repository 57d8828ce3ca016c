//! Headless duel runner.
//!
//! Runs battles without any front end. Designed for balance experiments,
//! CI determinism checks and reading battles as text.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in skirmish
//! cargo run -p duel_headless -- run
//!
//! # Run a scenario file, narrate it and save a JSON report
//! cargo run -p duel_headless -- run --scenario duel.ron --narrate --output report.json
//!
//! # Verify determinism of a seed across parallel runs
//! cargo run -p duel_headless -- verify --seed 42 --runs 16
//!
//! # Print the standard action catalog as RON
//! cargo run -p duel_headless -- catalog
//! ```
//!
//! Reports and narration go to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_core::catalog::ActionCatalog;
use duel_headless::{
    narrative::narrate,
    runner::{run_battle, verify_determinism},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "duel_headless")]
#[command(about = "Headless duel runner for scenario playback and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single battle to completion
    Run {
        /// Scenario file to load (built-in skirmish when omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's damage seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write the JSON report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the bincode event log to this file
        #[arg(long)]
        log_out: Option<PathBuf>,

        /// Print a play-by-play narration
        #[arg(long)]
        narrate: bool,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario file to load (built-in skirmish when omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Print an action catalog as RON
    Catalog {
        /// Catalog file to validate and print (standard table when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            output,
            log_out,
            narrate,
        }) => cmd_run(scenario, seed, output, log_out, narrate),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(scenario, seed, runs),
        Some(Commands::Catalog { file }) => cmd_catalog(file),
        None => cmd_run(None, None, None, None, true),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::skirmish()),
    }
}

/// Run a single battle
fn cmd_run(
    scenario: Option<PathBuf>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    log_out: Option<PathBuf>,
    narrate_battle: bool,
) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(scenario)?;
    tracing::info!(name = %scenario.name, "Running scenario");

    let report = run_battle(&scenario, seed)?;

    if narrate_battle {
        for line in narrate(&report.log) {
            println!("{line}");
        }
    }

    if let Some(path) = log_out {
        let bytes = report.log.encode()?;
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), "Event log written");
    }

    match output {
        Some(path) => {
            report.save(&path)?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None if !narrate_battle => {
            let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
            println!("{json}");
        }
        None => {}
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATTLE COMPLETE: {}", scenario.name);
    eprintln!("{}", "=".repeat(50));
    eprintln!("Seed:      {}", report.seed);
    eprintln!("Outcome:   {:?}", report.outcome);
    eprintln!("Timer:     {}", report.final_timer);
    eprintln!("Events:    {}", report.events_resolved);
    eprintln!(
        "Attacks:   {} (hit {}, blocked {}, breached {}, evaded {}, missed {})",
        report.attacks.total(),
        report.attacks.hits,
        report.attacks.blocked,
        report.attacks.breached,
        report.attacks.evaded,
        report.attacks.misses
    );
    for fighter in &report.fighters {
        eprintln!(
            "  {:<16} health {:>4}/{:<4} stamina {:>4}/{:<4}",
            fighter.name, fighter.health, fighter.max_health, fighter.stamina, fighter.max_stamina
        );
    }
    eprintln!("State hash: {:#018x}", report.final_state_hash);

    Ok(ExitCode::SUCCESS)
}

/// Verify determinism across parallel runs
fn cmd_verify(scenario: Option<PathBuf>, seed: u64, runs: u32) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(scenario)?;
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    let report = verify_determinism(&scenario, seed, runs);

    if report.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        eprintln!("  Hashes:   {:?}", report.hashes);
        for failure in &report.failures {
            eprintln!("  Failure:  {failure}");
        }
        Ok(ExitCode::FAILURE)
    }
}

/// Print an action catalog
fn cmd_catalog(file: Option<PathBuf>) -> Result<ExitCode, ScenarioError> {
    let catalog = match file {
        Some(path) => ActionCatalog::load(path)?,
        None => ActionCatalog::standard(),
    };
    println!("{}", catalog.to_ron_string()?);
    Ok(ExitCode::SUCCESS)
}
