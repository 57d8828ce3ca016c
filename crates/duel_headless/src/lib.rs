//! Headless duel runner for scenario playback and CI verification.
//!
//! This crate loads battle scenarios from RON, runs them to completion with
//! the deterministic engine, and reports the result. This enables:
//!
//! - **Balance checks**: Pit fighter presets against each other from the shell
//! - **CI verification**: Confirm that a seed always replays to the same state
//! - **Narration**: Render the event log as a readable play-by-play
//!
//! # Example
//!
//! ```bash
//! # Run the built-in skirmish and narrate it
//! cargo run -p duel_headless -- run --narrate
//!
//! # Run a scenario file with a different seed, writing a JSON report
//! cargo run -p duel_headless -- run --scenario scenarios/skirmish.ron --seed 7 --output report.json
//!
//! # Verify determinism
//! cargo run -p duel_headless -- verify --runs 8
//! ```

pub mod narrative;
pub mod runner;
pub mod scenario;

pub use narrative::{narrate, render_entry};
pub use runner::{run_battle, verify_determinism, BattleReport, VerifyReport};
pub use scenario::{FighterSetup, PolicySetup, Scenario, ScenarioError};
