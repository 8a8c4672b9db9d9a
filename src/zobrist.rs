//! Zobrist hashing of board contents.
//!
//! Every (square, pawn color) pair owns a random 64-bit key. A position's
//! hash is the XOR of the keys of its occupied squares, which lets
//! [`Position::play`](crate::position::Position::play) update it with three
//! XORs instead of rescanning the board.
//!
//! The table is shared by the whole process and built exactly once. All
//! search instances see the same keys, so a hash computed by one engine is
//! meaningful to another.

use std::sync::OnceLock;

use crate::constants::{BOARDSIZE, ZOBRIST_SEED};
use crate::position::{Piece, Square};

/// Keys for White pawns followed by keys for Black pawns.
struct ZobristTable {
    keys: [[u64; BOARDSIZE]; 2],
}

static TABLE: OnceLock<ZobristTable> = OnceLock::new();

#[inline]
fn table() -> &'static ZobristTable {
    TABLE.get_or_init(build_table)
}

fn build_table() -> ZobristTable {
    let mut rng = fastrand::Rng::with_seed(ZOBRIST_SEED);
    let mut keys = [[0u64; BOARDSIZE]; 2];
    for color in &mut keys {
        for key in color.iter_mut() {
            // Zero would make a pawn invisible to the hash.
            *key = loop {
                let value = rng.u64(..);
                if value != 0 {
                    break value;
                }
            };
        }
    }
    ZobristTable { keys }
}

/// Build the table now instead of on first use.
///
/// Call this once at start-up, before search threads are spawned. Calling it
/// again is a no-op.
pub fn init() {
    table();
}

/// Return the key of `piece` standing on `square`; empty squares hash to 0.
#[inline]
pub fn key(square: Square, piece: Piece) -> u64 {
    match piece {
        Piece::Empty => 0,
        Piece::White => table().keys[0][square as usize],
        Piece::Black => table().keys[1][square as usize],
    }
}

/// Compute a hash from scratch.
pub fn hash_squares(squares: &[Piece; BOARDSIZE]) -> u64 {
    squares
        .iter()
        .enumerate()
        .fold(0, |hash, (sq, &piece)| hash ^ key(sq as Square, piece))
}
