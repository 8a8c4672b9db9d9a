//! Search tree storage keyed by position hash.
//!
//! Nodes live in a growable arena and are found through a hash index, so
//! two move orders reaching the same position share one node and one
//! subtree. A [`NodeId`] is an index into the arena: inserting new nodes
//! never invalidates it, which lets the search hold on to a node while its
//! children are being created.

use std::collections::HashMap;

use crate::constants::ROOT_PARENT;
use crate::position::{Move, Position};

/// Stable handle to a node in a [`NodeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A node in the MCTS search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The position this node stands for
    pub state: Position,
    /// Move that led here from `parent` (`Move::NONE` at the root)
    pub mv: Move,
    /// Hash of the parent node, `ROOT_PARENT` at the root
    pub parent: u64,
    /// Child hashes in move generation order; empty until expanded
    pub children: Vec<u64>,
    /// Completed simulations credited to this node
    pub visits: u32,
    /// Accumulated reward
    pub reward: f64,
}

impl Node {
    pub fn new(state: Position, mv: Move, parent: u64) -> Self {
        Self {
            state,
            mv,
            parent,
            children: Vec::new(),
            visits: 0,
            reward: 0.0,
        }
    }

    /// A root node for `state`.
    pub fn root(state: Position) -> Self {
        Self::new(state, Move::NONE, ROOT_PARENT)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent == ROOT_PARENT
    }

    /// Average reward, 0 for an unvisited node.
    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward / self.visits as f64
        }
    }

    /// UCB1 score of this node as seen from a parent with `parent_visits` visits.
    ///
    /// Unvisited nodes score `+∞` so every child is tried once before any
    /// exploitation happens.
    pub fn ucb1(&self, parent_visits: u32, c: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        let exploit = self.reward / visits;
        if c == 0.0 {
            return exploit;
        }
        let explore = c * ((parent_visits.max(1) as f64).ln() / visits).sqrt();
        exploit + explore
    }
}

/// Arena of search nodes indexed by position hash.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    index: HashMap<u64, NodeId>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    /// Make room for `additional` nodes so the next insertions do not reallocate.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
        self.index.reserve(additional);
    }

    /// Find the node of a position hash.
    #[inline]
    pub fn lookup(&self, hash: u64) -> Option<NodeId> {
        self.index.get(&hash).copied()
    }

    /// Get the node of a position hash.
    #[inline]
    pub fn node(&self, hash: u64) -> Option<&Node> {
        self.lookup(hash).map(|id| self.get(id))
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Return the node stored under `hash`, creating it with `make` if absent.
    ///
    /// The flag tells whether a new node was inserted.
    pub fn get_or_insert_with(&mut self, hash: u64, make: impl FnOnce() -> Node) -> (NodeId, bool) {
        if let Some(id) = self.lookup(hash) {
            return (id, false);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(make());
        self.index.insert(hash, id);
        (id, true)
    }

    /// Child of `id` with the best UCB1 score, `None` for a leaf.
    ///
    /// Ties go to the child generated first.
    pub fn select_child(&self, id: NodeId, c: f64) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(NodeId, f64)> = None;
        for &hash in &node.children {
            let child = self.expect_node(hash);
            let score = self.get(child).ucb1(node.visits, c);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Credit `reward` to `id` and all its ancestors, flipping the sign at
    /// every level. The walk ends once a root has been updated.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) {
        let mut current = id;
        let mut reward = reward;
        loop {
            let node = self.get_mut(current);
            node.visits += 1;
            node.reward += reward;
            if node.is_root() {
                break;
            }
            let parent = node.parent;
            current = self.expect_node(parent);
            reward = -reward;
        }
    }

    /// Children of `id` as stable handles.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id)
            .children
            .iter()
            .map(|&hash| self.expect_node(hash))
    }

    fn expect_node(&self, hash: u64) -> NodeId {
        self.lookup(hash)
            .unwrap_or_else(|| panic!("search tree has no node for hash {hash:#018x}"))
    }
}
