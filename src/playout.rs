//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random pseudo-legal moves until one side breaks
//! through, then scores the result with a per-ply discount so that quick
//! outcomes weigh more than slow ones.

use crate::movegen::MoveGen;
use crate::position::{Move, Position};

/// Outcome of a single playout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playout {
    /// Plies played before the game ended.
    pub length: u32,
    /// Discounted result, `(2·win − 1)·discount^length`.
    pub reward: f64,
}

/// Pick a uniformly random move, or `None` when the game is over.
pub fn random_move(movegen: &mut MoveGen, pos: &Position, rng: &mut fastrand::Rng) -> Option<Move> {
    let moves = movegen.valid_moves(pos);
    if moves.is_empty() {
        return None;
    }
    Some(moves[rng.usize(..moves.len())])
}

/// Score a finished playout of `length` plies.
///
/// An even length is counted as a win for the side on move at the start.
#[inline]
pub fn playout_reward(length: u32, discount: f64) -> f64 {
    let win = length % 2 == 0;
    let sign = if win { 1.0 } else { -1.0 };
    sign * discount.powi(length as i32)
}

/// Play random moves on a copy of `pos` until the game is over.
///
/// A side left without moves has lost all its pawns and is scored the same
/// as a side whose goal rank was reached.
pub fn rollout(
    pos: &Position,
    movegen: &mut MoveGen,
    rng: &mut fastrand::Rng,
    discount: f64,
) -> Playout {
    let mut board = *pos;
    let start = board.ply();
    while let Some(mv) = random_move(movegen, &board, rng) {
        board.play(mv);
    }
    let length = board.ply() - start;
    Playout {
        length,
        reward: playout_reward(length, discount),
    }
}
