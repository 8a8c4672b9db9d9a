//! Integration tests for breakthrough-mcts
//!
//! These tests drive the public API the way a game does: positions are
//! reached by playing moves, searched, and answered.

use std::io::Cursor;

use breakthrough_mcts::constants::{BOARDSIZE, START_FEN};
use breakthrough_mcts::mcts::{Mcts, MctsConfig, SearchError};
use breakthrough_mcts::movegen::{MoveGen, valid_moves};
use breakthrough_mcts::position::{Move, Piece, Position, Side, square};
use breakthrough_mcts::protocol::GameLoop;
use breakthrough_mcts::tree::{Node, NodeStore};
use breakthrough_mcts::zobrist;

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

/// Play a sequence of moves such as `["d2e3", "e7e6"]` from the start.
fn setup_position(moves: &[&str]) -> Position {
    let mut pos = Position::new();
    for mv in moves {
        let mv: Move = mv.parse().unwrap();
        assert!(
            valid_moves(&pos).contains(&mv),
            "{mv} is not playable in {}",
            pos.fen()
        );
        pos.play(mv);
    }
    pos
}

/// Play random moves from the start for at most `plies` plies.
fn random_game(rng: &mut fastrand::Rng, plies: u32) -> Vec<Position> {
    let mut movegen = MoveGen::new();
    let mut pos = Position::new();
    let mut seen = vec![pos];
    for _ in 0..plies {
        let moves = movegen.valid_moves(&pos);
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.usize(..moves.len())];
        pos.play(mv);
        seen.push(pos);
    }
    seen
}

fn count_pawns(pos: &Position, piece: Piece) -> usize {
    pos.squares().iter().filter(|&&p| p == piece).count()
}

// =============================================================================
// Position tests
// =============================================================================

#[test]
fn test_start_position_text() {
    let pos = Position::new();
    assert_eq!(pos.fen(), START_FEN);
    assert_eq!(pos.side_to_move(), Side::White);
    assert_eq!(count_pawns(&pos, Piece::White), 16);
    assert_eq!(count_pawns(&pos, Piece::Black), 16);
}

#[test]
fn test_fen_round_trip_on_random_games() {
    let mut rng = fastrand::Rng::with_seed(2024);
    for _ in 0..25 {
        for pos in random_game(&mut rng, 200) {
            let text = pos.fen();
            let parsed = Position::from_fen(&text).unwrap();
            assert_eq!(parsed, pos, "round trip failed for {text}");
            assert_eq!(parsed.fen(), text);
        }
    }
}

#[test]
fn test_incremental_hash_matches_full_hash() {
    let mut rng = fastrand::Rng::with_seed(99);
    for _ in 0..10 {
        for pos in random_game(&mut rng, 200) {
            assert_eq!(pos.hash(), zobrist::hash_squares(pos.squares()));
        }
    }
}

#[test]
fn test_transposition_same_hash() {
    let a = setup_position(&["a2a3", "a7a6", "h2h3", "h7h6"]);
    let b = setup_position(&["h2h3", "h7h6", "a2a3", "a7a6"]);
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a, b);

    let c = setup_position(&["a2a3", "a7a6", "h2h3", "g7g6"]);
    assert_ne!(a.hash(), c.hash());
}

#[test]
fn test_capture_removes_pawn() {
    // White walks a pawn up until it can take on d7.
    let pos = setup_position(&["c2c3", "h7h6", "c3c4", "h6h5", "c4c5", "h5h4", "c5c6", "g7g6"]);
    let mut after = pos;
    after.play("c6d7".parse().unwrap());
    assert_eq!(after.at(square(3, 6)), Piece::White);
    assert_eq!(count_pawns(&after, Piece::Black), 15);
    assert_eq!(after.hash(), zobrist::hash_squares(after.squares()));
}

// =============================================================================
// Move generation tests
// =============================================================================

#[test]
fn test_start_has_22_moves() {
    let pos = Position::new();
    let moves = valid_moves(&pos);
    assert_eq!(moves.len(), 22);
    for mv in &moves {
        assert_eq!(pos.at(mv.source), Piece::White);
        assert_ne!(pos.at(mv.target), Piece::White);
    }
}

#[test]
fn test_moves_never_land_on_own_pawn() {
    let mut rng = fastrand::Rng::with_seed(5);
    for _ in 0..10 {
        for pos in random_game(&mut rng, 200) {
            let own = Piece::from(pos.side_to_move());
            for mv in valid_moves(&pos) {
                assert_eq!(pos.at(mv.source), own);
                assert_ne!(pos.at(mv.target), own);
                assert!((mv.target as usize) < BOARDSIZE);
            }
        }
    }
}

#[test]
fn test_random_games_end_with_a_winner() {
    let mut rng = fastrand::Rng::with_seed(31);
    for _ in 0..10 {
        let game = random_game(&mut rng, 500);
        let last = game.last().unwrap();
        assert!(valid_moves(last).is_empty(), "game did not end: {}", last.fen());
        assert!(last.is_over());
        assert_eq!(last.winner(), Some(last.side_to_move().opponent()));
        if !last.is_terminal() {
            // The only other way to run out of moves is to run out of pawns.
            assert_eq!(count_pawns(last, Piece::from(last.side_to_move())), 0);
        }
    }
}

// =============================================================================
// Terminal detection
// =============================================================================

#[test]
fn test_terminal_detection() {
    let white_through = Position::from_fen("P/////p/2P3P1 b - - 0 9").unwrap();
    assert!(white_through.is_terminal());
    assert_eq!(white_through.winner(), Some(Side::White));

    let black_through = Position::from_fen("2p/P//////p w - - 0 10").unwrap();
    assert!(black_through.is_terminal());
    assert_eq!(black_through.winner(), Some(Side::Black));

    // A pawn on the goal rank only counts against the side to move.
    let not_over = Position::from_fen("P/////p/2P3P1 w - - 0 9").unwrap();
    assert!(!not_over.is_terminal());
    assert_eq!(not_over.winner(), None);
}

// =============================================================================
// Node store tests
// =============================================================================

#[test]
fn test_store_shares_transposed_nodes() {
    let a = setup_position(&["a2a3", "a7a6", "h2h3", "h7h6"]);
    let b = setup_position(&["h2h3", "h7h6", "a2a3", "a7a6"]);
    let mut store = NodeStore::new();
    let (first, inserted) = store.get_or_insert_with(a.hash(), || Node::root(a));
    let (second, again) = store.get_or_insert_with(b.hash(), || Node::root(b));
    assert!(inserted);
    assert!(!again);
    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
}

// =============================================================================
// MCTS tests
// =============================================================================

#[test]
fn test_end_to_end_answer() {
    let pos = setup_position(&["d2e3"]);
    assert!(!pos.is_terminal());

    let mut mcts = Mcts::with_seed(11);
    let stats = mcts.ponder_iterations(&pos, 200);
    assert_eq!(stats.iterations, 200);
    let best = mcts.choose_best(&pos).unwrap();
    assert!(valid_moves(&pos).contains(&best));
}

#[test]
fn test_timed_ponder_produces_a_move() {
    let pos = setup_position(&["d2e3"]);
    let mut mcts = Mcts::new();
    let stats = mcts.ponder(&pos, 30);
    if stats.iterations == 0 {
        assert_eq!(mcts.choose_best(&pos), Err(SearchError::RootNotExpanded));
        mcts.ponder_iterations(&pos, 1);
    }
    let best = mcts.choose_best(&pos).unwrap();
    assert!(valid_moves(&pos).contains(&best));
}

#[test]
fn test_unvisited_children_tried_first() {
    let pos = Position::new();
    let mut mcts = Mcts::with_seed(13);
    mcts.ponder_iterations(&pos, 23);
    let children = mcts.root_children(&pos);
    assert_eq!(children.len(), 22);
    assert!(children.iter().all(|c| c.visits == 1));
}

#[test]
fn test_choose_best_most_visited() {
    let pos = Position::new();
    let mut mcts = Mcts::with_seed(21);
    mcts.ponder_iterations(&pos, 300);
    let children = mcts.root_children(&pos);
    let most = children.iter().map(|c| c.visits).max().unwrap();
    let first_most = children.iter().find(|c| c.visits == most).unwrap();
    assert_eq!(mcts.choose_best(&pos), Ok(first_most.mv));
}

#[test]
fn test_blocks_imminent_breakthrough() {
    // Black threatens to reach rank 1 from b2; White must capture it.
    let pos = Position::from_fen("2P/1p//////7p w - - 0 20").unwrap();
    assert_eq!(pos.side_to_move(), Side::White);
    let mut mcts = Mcts::with_config(MctsConfig::default()).seeded(42);
    mcts.ponder_iterations(&pos, 2000);
    let best = mcts.choose_best(&pos).unwrap();
    assert_eq!(best, "c1b2".parse().unwrap(), "expected the capture, got {best}");
}

#[test]
fn test_search_follows_side_to_move_on_reused_squares() {
    let white = Position::from_fen("///3P//4p// w - - 0 1").unwrap();
    let black = Position::from_fen("///3P//4p// b - - 0 1").unwrap();
    assert_eq!(white.hash(), black.hash());

    let mut mcts = Mcts::with_seed(19);
    mcts.ponder_iterations(&black, 30);
    let reply = mcts.choose_best(&black).unwrap();
    assert!(valid_moves(&black).contains(&reply));

    mcts.ponder_iterations(&white, 30);
    let best = mcts.choose_best(&white).unwrap();
    assert!(valid_moves(&white).contains(&best), "got {best}");
}

#[test]
fn test_search_is_reproducible_with_seed() {
    let pos = setup_position(&["e2e3", "d7d6"]);
    let mut a = Mcts::with_seed(77);
    let mut b = Mcts::with_seed(77);
    a.ponder_iterations(&pos, 150);
    b.ponder_iterations(&pos, 150);
    assert_eq!(a.root_children(&pos), b.root_children(&pos));
}

// =============================================================================
// Protocol tests
// =============================================================================

#[test]
fn test_capturing_last_pawn_ends_game() {
    let mut pos = Position::from_fen("///3P/4p/// w - - 0 1").unwrap();
    pos.play("d4e5".parse().unwrap());
    assert!(!pos.is_terminal());
    assert!(pos.is_over());
    assert!(valid_moves(&pos).is_empty());
    assert_eq!(pos.winner(), Some(Side::White));
}

#[test]
fn test_protocol_plays_a_few_turns() {
    let mut game = GameLoop::new(Mcts::with_seed(3), 5);
    let mut output = Vec::new();
    game.run(Cursor::new("None\n0\n"), &mut output).unwrap();
    let reply = String::from_utf8(output).unwrap();
    let first: Move = reply.trim().parse().unwrap();
    assert!(valid_moves(&Position::new()).contains(&first));

    let answer = valid_moves(game.position())[0];
    let mut output = Vec::new();
    game.run(Cursor::new(format!("{answer}\n1\nignored\n")), &mut output)
        .unwrap();
    let reply = String::from_utf8(output).unwrap();
    let second: Move = reply.trim().parse().unwrap();
    assert_eq!(game.position().ply(), 3);

    let mut expected = Position::new();
    expected.play(first);
    expected.play(answer);
    assert!(valid_moves(&expected).contains(&second));
}
