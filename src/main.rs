//! Breakthrough MCTS engine.
//!
//! ## Usage
//!
//! - `breakthrough-mcts` - Play a game over stdin/stdout
//! - `breakthrough-mcts demo` - Watch the engine play itself
//! - `breakthrough-mcts moves --fen <FEN>` - List the moves of a position
//! - `breakthrough-mcts think --fen <FEN>` - Search once and report

use std::io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use breakthrough_mcts::constants::{EXPLORATION, N_ROLLOUTS, PONDER_MS, ROLLOUT_DISCOUNT};
use breakthrough_mcts::mcts::{Mcts, MctsConfig};
use breakthrough_mcts::movegen::valid_moves;
use breakthrough_mcts::position::Position;
use breakthrough_mcts::protocol::GameLoop;
use breakthrough_mcts::zobrist;

/// Breakthrough player driven by Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "breakthrough-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Log search details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct EngineArgs {
    /// Thinking time per move in milliseconds
    #[arg(long, global = true, default_value_t = PONDER_MS)]
    ponder_ms: u64,

    /// Random playouts per child of an expanded node
    #[arg(long, global = true, default_value_t = N_ROLLOUTS as u32,
          value_parser = clap::value_parser!(u32).range(1..))]
    rollouts: u32,

    /// UCB1 exploration constant
    #[arg(long, global = true, default_value_t = EXPLORATION)]
    exploration: f64,

    /// Seed for the rollout random generator
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl EngineArgs {
    fn engine(&self) -> Mcts {
        let mcts = Mcts::with_config(MctsConfig {
            exploration: self.exploration,
            n_rollouts: self.rollouts,
            discount: ROLLOUT_DISCOUNT,
        });
        match self.seed {
            Some(seed) => mcts.seeded(seed),
            None => mcts,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play one side of a game over stdin/stdout
    Play,
    /// Let the engine play against itself
    Demo {
        /// Starting position
        #[arg(long)]
        fen: Option<String>,
        /// Stop after this many plies
        #[arg(long, default_value_t = 200)]
        max_plies: u32,
    },
    /// Print the pseudo-legal moves of a position
    Moves {
        #[arg(long)]
        fen: Option<String>,
    },
    /// Search a position once and print the root statistics
    Think {
        #[arg(long)]
        fen: Option<String>,
    },
}

/// Logs go to stderr; stdout carries the game protocol.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_position(fen: Option<&str>) -> Result<Position> {
    match fen {
        Some(fen) => Position::from_fen(fen).with_context(|| format!("invalid position '{fen}'")),
        None => Ok(Position::new()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    zobrist::init();

    match cli.command {
        Some(Commands::Play) | None => {
            let mut game = GameLoop::new(cli.engine.engine(), cli.engine.ponder_ms);
            game.run(io::stdin().lock(), io::stdout())
        }
        Some(Commands::Demo { fen, max_plies }) => {
            let pos = load_position(fen.as_deref())?;
            run_demo(pos, &cli.engine, max_plies)
        }
        Some(Commands::Moves { fen }) => {
            let pos = load_position(fen.as_deref())?;
            for mv in valid_moves(&pos) {
                println!("{mv}");
            }
            Ok(())
        }
        Some(Commands::Think { fen }) => {
            let pos = load_position(fen.as_deref())?;
            run_think(pos, &cli.engine)
        }
    }
}

fn run_demo(mut pos: Position, args: &EngineArgs, max_plies: u32) -> Result<()> {
    let mut mcts = args.engine();
    println!("{pos}");

    let start_ply = pos.ply();
    while !pos.is_over() && pos.ply() - start_ply < max_plies {
        let stats = mcts.ponder(&pos, args.ponder_ms);
        let mv = mcts
            .choose_best(&pos)
            .with_context(|| format!("no move after {} iterations", stats.iterations))?;
        println!(
            "{:>3}. {} plays {mv} ({} iterations, {} nodes)",
            pos.ply() + 1,
            pos.side_to_move(),
            stats.iterations,
            stats.nodes
        );
        pos.play(mv);
        println!("{pos}");
    }

    match pos.winner() {
        Some(side) => println!("{side} wins after {} plies", pos.ply()),
        None => println!("stopped after {} plies", pos.ply()),
    }
    info!(fen = %pos.fen(), "demo finished");
    Ok(())
}

fn run_think(pos: Position, args: &EngineArgs) -> Result<()> {
    let mut mcts = args.engine();
    let stats = mcts.ponder(&pos, args.ponder_ms);
    println!("{pos}");
    println!(
        "{} iterations, {} nodes in {} ms",
        stats.iterations,
        stats.nodes,
        stats.elapsed.as_millis()
    );
    for child in mcts.root_children(&pos) {
        println!(
            "move {} v={} mean={:.3}",
            child.mv, child.visits, child.mean_reward
        );
    }
    let best = mcts
        .choose_best(&pos)
        .context("search did not finish a single iteration, raise --ponder-ms")?;
    println!("best {best}");
    Ok(())
}
