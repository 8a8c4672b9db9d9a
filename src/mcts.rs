//! Monte Carlo Tree Search (MCTS) over a transposition-sharing tree.
//!
//! Every iteration (`step`) runs four phases starting at the root:
//! - Selection: descend by UCB1 until a leaf is reached
//! - Expansion: create a node for every move of the leaf
//! - Rollout: play a batch of random games from each new child
//! - Backpropagation: credit the averaged result to the leaf and its
//!   ancestors, flipping the sign at every level
//!
//! Rollouts are batched per expansion: their average is credited to the
//! expanded node, while the children themselves keep zero statistics until
//! the search selects and expands them in a later iteration.
//!
//! Nodes are stored in a [`NodeStore`] keyed by position hash and survive
//! across calls to [`Mcts::ponder`], so consecutive searches in the same
//! game reuse earlier work.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use crate::constants::{EXPLORATION, N_ROLLOUTS, ROLLOUT_DISCOUNT, ROOT_PARENT};
use crate::movegen::MoveGen;
use crate::playout::rollout;
use crate::position::{Move, Position};
use crate::tree::{Node, NodeId, NodeStore};

/// Errors returned by move queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("position {0} has not been searched")]
    UnknownPosition(String),

    #[error("root has no children, ponder longer before choosing a move")]
    RootNotExpanded,
}

/// Search parameters.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// UCB1 exploration constant used while searching.
    pub exploration: f64,

    /// Random playouts per child of an expanded node.
    pub n_rollouts: u32,

    /// Per-ply discount of a playout result.
    pub discount: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION,
            n_rollouts: N_ROLLOUTS as u32,
            discount: ROLLOUT_DISCOUNT,
        }
    }
}

/// Summary of one call to [`Mcts::ponder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    pub iterations: u64,
    pub nodes: usize,
    pub elapsed: Duration,
}

/// Statistics of one root child, for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildStats {
    pub mv: Move,
    pub visits: u32,
    pub mean_reward: f64,
}

/// Credit of a finished game to the node whose move ended it.
const WIN: f64 = 1.0;

/// MCTS engine. Each instance owns its tree and its random source.
pub struct Mcts {
    store: NodeStore,
    config: MctsConfig,
    movegen: MoveGen,
    rng: fastrand::Rng,
}

impl Default for Mcts {
    fn default() -> Self {
        Self::new()
    }
}

impl Mcts {
    pub fn new() -> Self {
        Self::with_config(MctsConfig::default())
    }

    pub fn with_config(config: MctsConfig) -> Self {
        Self {
            store: NodeStore::new(),
            config,
            movegen: MoveGen::new(),
            rng: fastrand::Rng::new(),
        }
    }

    /// Engine with default parameters and reproducible rollouts.
    pub fn with_seed(seed: u64) -> Self {
        Self::new().seeded(seed)
    }

    /// Replace the random source with a seeded one.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    /// Discard all accumulated statistics.
    pub fn reset(&mut self) {
        self.store.clear();
    }

    /// Search from `pos` until `ms` milliseconds have elapsed.
    ///
    /// The clock is checked between iterations only, so the last iteration
    /// always completes. A tiny budget may run no iteration at all.
    pub fn ponder(&mut self, pos: &Position, ms: u64) -> SearchStats {
        let root = self.ensure_root(pos);
        let budget = Duration::from_millis(ms);
        let start = Instant::now();
        let mut iterations = 0;
        while start.elapsed() < budget {
            self.step(root);
            iterations += 1;
        }
        self.finish(root, iterations, start)
    }

    /// Search from `pos` for exactly `iterations` iterations.
    pub fn ponder_iterations(&mut self, pos: &Position, iterations: u64) -> SearchStats {
        let root = self.ensure_root(pos);
        let start = Instant::now();
        for _ in 0..iterations {
            self.step(root);
        }
        self.finish(root, iterations, start)
    }

    fn finish(&self, root: NodeId, iterations: u64, start: Instant) -> SearchStats {
        let stats = SearchStats {
            iterations,
            nodes: self.store.len(),
            elapsed: start.elapsed(),
        };
        debug!(
            iterations = stats.iterations,
            nodes = stats.nodes,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            root_visits = self.store.get(root).visits,
            "search finished"
        );
        stats
    }

    /// Make sure `pos` has a node and mark it as the root of the search.
    fn ensure_root(&mut self, pos: &Position) -> NodeId {
        let (root, inserted) = self
            .store
            .get_or_insert_with(pos.hash(), || Node::root(*pos));
        if !inserted {
            // A former child becomes the root: cut the walk to its old parent.
            let node = self.store.get_mut(root);
            node.parent = ROOT_PARENT;
            node.mv = Move::NONE;
            // Hashes ignore the side to move: the stored children may be the other side's.
            if node.state.side_to_move() != pos.side_to_move() {
                debug!(fen = %pos.fen(), "root reused with the other side to move");
                node.children.clear();
                node.visits = 0;
                node.reward = 0.0;
            }
            node.state = *pos;
        }
        root
    }

    /// Run one select, expand, rollout, backpropagate cycle.
    pub fn step(&mut self, root: NodeId) {
        let mut leaf = root;
        let mut depth = 0u32;
        while let Some(child) = self.store.select_child(leaf, self.config.exploration) {
            leaf = child;
            depth += 1;
        }

        let over = self.store.get(leaf).state.is_terminal() || self.expand(leaf) == 0;
        if over {
            // The leaf's side to move has lost, so the move into it won. Node
            // rewards are kept for the side that moved in, hence always +1
            // here; the sign flips above turn it into -1 on the root's
            // child whenever the opponent made the final move.
            trace!(depth, root_side_won = depth % 2 == 1, "terminal leaf");
            self.store.backpropagate(leaf, WIN);
            return;
        }

        let reward = self.rollout_children(leaf);
        trace!(depth, reward, children = self.store.get(leaf).children.len(), "expanded leaf");
        self.store.backpropagate(leaf, reward);
    }

    /// Create (or reuse) a node for every move of a leaf; returns the child count.
    ///
    /// Reused nodes are re-parented to this leaf.
    fn expand(&mut self, leaf: NodeId) -> usize {
        let Self { store, movegen, .. } = self;
        let parent_state = store.get(leaf).state;
        let parent_hash = parent_state.hash();
        debug_assert!(store.get(leaf).is_leaf(), "expanding an expanded node");

        let moves = movegen.valid_moves(&parent_state);
        store.reserve(moves.len());

        let mut children = Vec::with_capacity(moves.len());
        for &mv in moves {
            let mut board = parent_state;
            board.play(mv);
            let child_hash = board.hash();
            let (child, _) =
                store.get_or_insert_with(child_hash, || Node::new(board, mv, parent_hash));
            let node = store.get_mut(child);
            node.parent = parent_hash;
            node.mv = mv;
            children.push(child_hash);
        }

        let count = children.len();
        store.get_mut(leaf).children = children;
        count
    }

    /// Average rollout result over every child of `node`, from `node`'s side.
    fn rollout_children(&mut self, node: NodeId) -> f64 {
        let states: Vec<Position> = self
            .store
            .children(node)
            .map(|child| self.store.get(child).state)
            .collect();
        let n_rollouts = self.config.n_rollouts.max(1);

        let mut total = 0.0;
        for state in &states {
            for _ in 0..n_rollouts {
                let playout =
                    rollout(state, &mut self.movegen, &mut self.rng, self.config.discount);
                // Rollouts score for the child's side to move.
                total -= playout.reward;
            }
        }
        total / (states.len() as f64 * n_rollouts as f64)
    }

    /// Most visited root child's move (robust child).
    ///
    /// Fails if `pos` was never searched or its node has no children yet.
    pub fn choose_best(&self, pos: &Position) -> Result<Move, SearchError> {
        let root = self
            .store
            .lookup(pos.hash())
            .ok_or_else(|| SearchError::UnknownPosition(pos.fen()))?;
        let mut best: Option<&Node> = None;
        for child in self.store.children(root) {
            let node = self.store.get(child);
            if best.is_none_or(|b| node.visits > b.visits) {
                best = Some(node);
            }
        }
        best.map(|node| node.mv).ok_or(SearchError::RootNotExpanded)
    }

    /// Move with the best average reward, ignoring exploration.
    pub fn best_by_reward(&self, pos: &Position) -> Result<Move, SearchError> {
        let root = self
            .store
            .lookup(pos.hash())
            .ok_or_else(|| SearchError::UnknownPosition(pos.fen()))?;
        self.store
            .select_child(root, 0.0)
            .map(|child| self.store.get(child).mv)
            .ok_or(SearchError::RootNotExpanded)
    }

    /// Per-child statistics of a searched position, in move generation order.
    pub fn root_children(&self, pos: &Position) -> Vec<ChildStats> {
        let Some(root) = self.store.lookup(pos.hash()) else {
            return Vec::new();
        };
        self.store
            .children(root)
            .map(|child| {
                let node = self.store.get(child);
                ChildStats {
                    mv: node.mv,
                    visits: node.visits,
                    mean_reward: node.mean_reward(),
                }
            })
            .collect()
    }

    /// Log the root children's statistics.
    pub fn dump_children(&self, pos: &Position) {
        for child in self.root_children(pos) {
            debug!(
                mv = %child.mv,
                visits = child.visits,
                mean = format_args!("{:.3}", child.mean_reward),
                "root child"
            );
        }
    }
}
