//! Pseudo-legal move generation.
//!
//! A pawn moves one rank toward the opponent: straight ahead onto an empty
//! square, or diagonally onto a square that is empty or holds an enemy
//! pawn. Nothing is generated once the game is over.

use crate::constants::{BOARDSIZE, N};
use crate::position::{Move, Piece, Position, Side, Square, file_of};

/// Upper bound on the number of moves in any position (16 pawns, 3 moves each).
const MAX_MOVES: usize = 48;

/// Move generator with a reusable output buffer.
#[derive(Debug, Clone)]
pub struct MoveGen {
    moves: Vec<Move>,
}

impl Default for MoveGen {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGen {
    pub fn new() -> Self {
        Self {
            moves: Vec::with_capacity(MAX_MOVES),
        }
    }

    /// Generate the moves of the side to move.
    ///
    /// Moves are ordered by source square, then forward, left diagonal,
    /// right diagonal. The returned slice is valid until the next call.
    pub fn valid_moves(&mut self, pos: &Position) -> &[Move] {
        self.moves.clear();
        if pos.is_terminal() {
            return &self.moves;
        }

        let side = pos.side_to_move();
        let own = Piece::from(side);
        let step: Square = match side {
            Side::White => N as Square,
            Side::Black => -(N as Square),
        };

        for s in 0..BOARDSIZE as Square {
            if pos.at(s) != own {
                continue;
            }
            // Only hand-built positions can hold a mover on its goal rank.
            let t = s + step;
            if !(0..BOARDSIZE as Square).contains(&t) {
                continue;
            }
            if pos.at(t).is_empty() {
                self.moves.push(Move::new(s, t));
            }
            let file = file_of(s);
            if file > 0 && pos.at(t - 1) != own {
                self.moves.push(Move::new(s, t - 1));
            }
            if file < N - 1 && pos.at(t + 1) != own {
                self.moves.push(Move::new(s, t + 1));
            }
        }
        &self.moves
    }
}

/// Generate moves into a fresh vector.
pub fn valid_moves(pos: &Position) -> Vec<Move> {
    MoveGen::new().valid_moves(pos).to_vec()
}
