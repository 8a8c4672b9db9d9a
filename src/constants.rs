//! Constants for board geometry, MCTS parameters, and text formats.
//!
//! This module contains the compile-time configuration of the engine.
//! The board is a flat 64-element array indexed row-major from `a1` (0)
//! to `h8` (63). Runtime overrides of the search parameters go through
//! [`crate::mcts::MctsConfig`].

// =============================================================================
// Board Geometry
// =============================================================================

/// Board width and height.
pub const N: usize = 8;

/// Number of squares on the board.
pub const BOARDSIZE: usize = N * N;

/// Rank holding White's pawns at the start, and Black's goal.
pub const WHITE_HOME_RANK: usize = 0;

/// Rank holding Black's pawns at the start, and White's goal.
pub const BLACK_HOME_RANK: usize = N - 1;

/// Number of pawns each side starts with (two full ranks).
pub const PAWNS_PER_SIDE: usize = 2 * N;

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// UCB1 exploration constant used while searching (sqrt 2).
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Number of random playouts run from every freshly expanded child.
pub const N_ROLLOUTS: usize = 5;

/// Per-ply discount applied to a rollout result.
pub const ROLLOUT_DISCOUNT: f64 = 0.99;

/// Default thinking time per move in milliseconds.
pub const PONDER_MS: u64 = 90;

/// Parent hash marking the root of the search tree.
pub const ROOT_PARENT: u64 = 0;

// =============================================================================
// Zobrist Hashing
// =============================================================================

/// Seed of the process-wide Zobrist table.
pub const ZOBRIST_SEED: u64 = 42;

// =============================================================================
// Text Formats
// =============================================================================

/// File letters, `a` is file 0.
pub const FILES: &[u8; N] = b"abcdefgh";

/// Placeholder fields written between the side to move and the move counter.
pub const FEN_PLACEHOLDERS: &str = "- - 0";

/// Serialized standard starting position.
pub const START_FEN: &str = "PPPPPPPP/PPPPPPPP/////pppppppp/pppppppp w - - 0 1";
