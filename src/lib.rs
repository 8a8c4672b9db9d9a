//! Breakthrough-MCTS: a Monte Carlo Tree Search player for Breakthrough.
//!
//! Breakthrough is played on an 8x8 board with two rows of pawns per side.
//! Pawns step straight or diagonally forward and capture diagonally; the
//! first side to reach the opponent's home rank wins.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry and engine parameters
//! - [`zobrist`] - Process-wide hashing keys
//! - [`position`] - Game state, moves and the compact text format
//! - [`movegen`] - Pseudo-legal move generation
//! - [`playout`] - Random game simulation for position evaluation
//! - [`tree`] - Hash-keyed node storage
//! - [`mcts`] - Monte Carlo Tree Search with UCB1 selection
//! - [`protocol`] - Line-oriented game loop over stdin/stdout
//!
//! ## Example
//!
//! ```
//! use breakthrough_mcts::mcts::Mcts;
//! use breakthrough_mcts::movegen::valid_moves;
//! use breakthrough_mcts::position::Position;
//!
//! // Start a game and answer White's first move
//! let mut pos = Position::new();
//! pos.play("d2e3".parse().unwrap());
//!
//! let mut mcts = Mcts::with_seed(1);
//! mcts.ponder_iterations(&pos, 50);
//! let best = mcts.choose_best(&pos).unwrap();
//! assert!(valid_moves(&pos).contains(&best));
//! println!("Best move: {best}");
//! ```

pub mod constants;
pub mod mcts;
pub mod movegen;
pub mod playout;
pub mod position;
pub mod protocol;
pub mod tree;
pub mod zobrist;
