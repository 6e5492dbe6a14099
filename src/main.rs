//! Grid Skirmish - Main Binary
//!
//! Headless terminal runner for the grid battle rule engine

use anyhow::Context;
use clap::{Parser, Subcommand};
use grid_skirmish::{
    core::{PlayerId, Position},
    game::{MatchState, RandomPolicy, TurnEngine, VerbosityLevel},
    loader::{ContentLoader, ContentSet},
};
use std::path::PathBuf;

/// Verbosity level for match output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Grid Skirmish - turn-based grid battle engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless AI-vs-AI match
    Run {
        /// Content file (.txt) with unit and ability definitions
        #[arg(value_name = "CONTENT_FILE", default_value = "content/skirmish_basic.txt")]
        content: PathBuf,

        /// Set random seed for deterministic matches
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum full turn cycles before calling the match a draw
        #[arg(long, default_value_t = 30)]
        max_cycles: u32,

        /// Board width
        #[arg(long, default_value_t = 6)]
        width: i32,

        /// Board height
        #[arg(long, default_value_t = 6)]
        height: i32,

        /// Verbosity level for match output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Dump the event log as JSON lines after the match
        #[arg(long)]
        events_json: bool,
    },

    /// Parse a content file and report warnings
    Validate {
        /// Content file (.txt) to check
        #[arg(value_name = "CONTENT_FILE")]
        content: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            content,
            seed,
            max_cycles,
            width,
            height,
            verbosity,
            events_json,
        } => {
            let set = ContentLoader::load_from_file(&content)
                .with_context(|| format!("loading content from {}", content.display()))?;
            report_warnings(&set);
            run_match(set, seed, max_cycles, width, height, verbosity.0, events_json).await
        }
        Commands::Validate { content } => {
            let set = ContentLoader::load_from_file(&content)
                .with_context(|| format!("loading content from {}", content.display()))?;
            report_warnings(&set);
            println!(
                "{} unit types, {} with abilities, {} warnings",
                set.definitions.len(),
                set.registry.type_count(),
                set.warnings.len()
            );
            Ok(())
        }
    }
}

fn report_warnings(set: &ContentSet) {
    for warning in &set.warnings {
        eprintln!("warning: {warning}");
    }
}

async fn run_match(
    set: ContentSet,
    seed: Option<u64>,
    max_cycles: u32,
    width: i32,
    height: i32,
    verbosity: VerbosityLevel,
    events_json: bool,
) -> anyhow::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    println!("seed: {seed}");

    let mut state = MatchState::new(width, height);
    state.logger.set_verbosity(verbosity);
    deploy_rosters(&mut state, &set)?;

    let mut player = RandomPolicy::with_seed(PlayerId::PLAYER, seed);
    let mut enemy = RandomPolicy::with_seed(PlayerId::ENEMY, seed.wrapping_add(1));

    let mut engine = TurnEngine::new(&mut state, &set.registry).with_max_cycles(max_cycles);
    let result = engine.run_match(&mut player, &mut enemy).await;

    match result.winner {
        Some(winner) => println!(
            "player {winner} wins after {} cycles ({:?})",
            result.cycles_played, result.end_reason
        ),
        None => println!(
            "no winner after {} cycles ({:?})",
            result.cycles_played, result.end_reason
        ),
    }
    println!("{} events emitted", state.bus.events().len());

    if events_json {
        println!("{}", state.bus.events_as_json_lines());
    }
    Ok(())
}

/// Deploy each roster mirrored: player 0 along the bottom rows, player 1
/// along the top
fn deploy_rosters(state: &mut MatchState, set: &ContentSet) -> anyhow::Result<()> {
    let width = state.board.width();
    let height = state.board.height();
    for (index, def) in set.definitions.iter().enumerate() {
        let index = index as i32;
        let (x, row) = (index % width, index / width);
        state
            .spawn_from(def, PlayerId::PLAYER, Position::new(x, row))
            .context("deploying player roster")?;
        state
            .spawn_from(def, PlayerId::ENEMY, Position::new(width - 1 - x, height - 1 - row))
            .context("deploying enemy roster")?;
    }
    Ok(())
}
