//! Line-oriented game loop.
//!
//! The engine plays one side of a game refereed by another program. Each
//! turn the referee sends:
//!
//! ```text
//! <opponent move, e.g. d2e3, or None if the engine moves first>
//! <n>
//! <n lines listing the engine's legal moves, ignored>
//! ```
//!
//! The engine answers with its own move on a single line.
//!
//! ## Example
//!
//! ```ignore
//! use breakthrough_mcts::mcts::Mcts;
//! use breakthrough_mcts::protocol::GameLoop;
//! let mut game = GameLoop::new(Mcts::new(), 90);
//! game.run(std::io::stdin().lock(), std::io::stdout())?;
//! ```

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::mcts::{Mcts, SearchError};
use crate::movegen::MoveGen;
use crate::position::{Move, Position};

/// Game state of the protocol loop.
pub struct GameLoop {
    /// Current game position
    pos: Position,
    /// Search engine, kept across turns so the tree is reused
    mcts: Mcts,
    /// Thinking time per move
    ponder_ms: u64,
    movegen: MoveGen,
}

impl GameLoop {
    pub fn new(mcts: Mcts, ponder_ms: u64) -> Self {
        Self {
            pos: Position::new(),
            mcts,
            ponder_ms,
            movegen: MoveGen::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Run turns until the input ends or the game is over.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next() {
            let line = line.context("failed to read opponent move")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let opponent = Self::parse_opponent(line)?;
            let count_line = lines
                .next()
                .context("missing legal move count")?
                .context("failed to read legal move count")?;
            let count: usize = count_line
                .trim()
                .parse()
                .with_context(|| format!("invalid legal move count '{}'", count_line.trim()))?;
            for _ in 0..count {
                lines
                    .next()
                    .context("legal move listing ended early")?
                    .context("failed to read legal move")?;
            }

            match self.turn(opponent)? {
                Some(mv) => {
                    writeln!(output, "{mv}")?;
                    output.flush()?;
                }
                None => {
                    info!(winner = ?self.pos.winner(), "game over");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Parse the opponent's move line; `None` means there is no move to apply.
    fn parse_opponent(line: &str) -> Result<Option<Move>> {
        if line.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        let mv = line
            .parse::<Move>()
            .with_context(|| format!("cannot read opponent move '{line}'"))?;
        Ok(Some(mv))
    }

    /// Apply the opponent's move and answer with ours.
    ///
    /// Returns `None` once the game is over.
    pub fn turn(&mut self, opponent: Option<Move>) -> Result<Option<Move>> {
        if let Some(mv) = opponent {
            if !self.movegen.valid_moves(&self.pos).contains(&mv) {
                bail!("illegal opponent move {mv} in position {}", self.pos.fen());
            }
            self.pos.play(mv);
            debug!(%mv, fen = %self.pos.fen(), "opponent moved");
        }
        if self.pos.is_over() {
            return Ok(None);
        }

        self.mcts.ponder(&self.pos, self.ponder_ms);
        let mv = match self.mcts.choose_best(&self.pos) {
            Ok(mv) => mv,
            Err(SearchError::RootNotExpanded) => {
                // The budget ran out before the first iteration finished.
                self.mcts.ponder_iterations(&self.pos, 1);
                self.mcts.choose_best(&self.pos)?
            }
            Err(err) => return Err(err.into()),
        };
        self.mcts.dump_children(&self.pos);
        self.pos.play(mv);
        debug!(%mv, fen = %self.pos.fen(), "engine moved");
        Ok(Some(mv))
    }
}
