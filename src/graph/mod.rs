//! In-memory coaching graph.
//!
//! Users are stored in a flat vector and addressed by [`NodeIdx`]. Edges are
//! kept as per-node adjacency lists of indices in both directions, so the
//! graph never holds references between nodes.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{GraphError, Result};
use crate::features::{FeatureSet, FeatureUpdate};
use crate::types::NodeIdx;

mod options;
mod traversal;

pub use options::GraphOptions;

type Adjacency = SmallVec<[NodeIdx; 4]>;

/// A single user in a coaching graph.
#[derive(Clone, Debug)]
pub struct UserNode {
    id: String,
    features: FeatureSet,
    incoming: Adjacency,
    outgoing: Adjacency,
}

impl UserNode {
    fn new(id: String) -> Self {
        Self {
            id,
            features: FeatureSet::new(),
            incoming: Adjacency::new(),
            outgoing: Adjacency::new(),
        }
    }

    /// The user's unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Features currently carried by the user.
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Nodes with an edge into this node (the user's coaches).
    pub fn incoming(&self) -> &[NodeIdx] {
        &self.incoming
    }

    /// Nodes this node has an edge to (the user's students).
    pub fn outgoing(&self) -> &[NodeIdx] {
        &self.outgoing
    }

    /// Incoming and outgoing neighbors. A node that is both appears twice.
    pub fn neighbors(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.incoming.iter().chain(self.outgoing.iter()).copied()
    }

    /// Whether the user coaches anybody.
    pub fn is_parent(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Whether the user has no edges at all.
    pub fn is_singleton(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// Directed coaching graph owning every user and edge.
#[derive(Clone, Debug)]
pub struct CoachingGraph {
    nodes: Vec<UserNode>,
    index: FxHashMap<String, NodeIdx>,
    directed: bool,
    edge_count: usize,
}

impl CoachingGraph {
    /// Creates an empty graph.
    pub fn new(opts: GraphOptions) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(opts.capacity);
        Self {
            nodes: Vec::with_capacity(opts.capacity),
            index,
            directed: opts.directed,
            edge_count: 0,
        }
    }

    /// Creates an empty directed graph.
    pub fn directed() -> Self {
        Self::new(GraphOptions::new())
    }

    /// Whether edges are one-way.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no users.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of distinct directed edges recorded.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Adds a user, returning its index. Existing users are left untouched.
    pub fn add_node(&mut self, id: impl Into<String>) -> NodeIdx {
        let id = id.into();
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = NodeIdx(self.nodes.len() as u32);
        self.index.insert(id.clone(), idx);
        self.nodes.push(UserNode::new(id));
        idx
    }

    /// Adds an edge from `from` to `to`, creating either endpoint if missing.
    pub fn add_edge(&mut self, from: &str, to: &str) -> (NodeIdx, NodeIdx) {
        let u = self.add_node(from);
        let v = self.add_node(to);
        self.link(u, v);
        if !self.directed {
            self.link(v, u);
        }
        (u, v)
    }

    fn link(&mut self, from: NodeIdx, to: NodeIdx) {
        let outgoing = &mut self.nodes[from.as_usize()].outgoing;
        if outgoing.contains(&to) {
            return;
        }
        outgoing.push(to);
        self.nodes[to.as_usize()].incoming.push(from);
        self.edge_count += 1;
    }

    /// Looks up a user by id.
    pub fn find_node(&self, id: &str) -> Result<&UserNode> {
        self.index_of(id).map(|idx| &self.nodes[idx.as_usize()])
    }

    /// Resolves a user id to its index.
    pub fn index_of(&self, id: &str) -> Result<NodeIdx> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::not_found(id))
    }

    /// Whether a user with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the node at `idx`, if any.
    pub fn node(&self, idx: NodeIdx) -> Option<&UserNode> {
        self.nodes.get(idx.as_usize())
    }

    /// Iterates users in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &UserNode> {
        self.nodes.iter()
    }

    /// Ids of the users `id` coaches.
    pub fn students_of(&self, id: &str) -> Result<Vec<&str>> {
        let node = self.find_node(id)?;
        Ok(self.ids(node.outgoing()))
    }

    /// Ids of the users coaching `id`.
    pub fn coaches_of(&self, id: &str) -> Result<Vec<&str>> {
        let node = self.find_node(id)?;
        Ok(self.ids(node.incoming()))
    }

    /// Maps indices back to user ids.
    pub fn ids(&self, idxs: &[NodeIdx]) -> Vec<&str> {
        idxs.iter()
            .map(|idx| self.nodes[idx.as_usize()].id.as_str())
            .collect()
    }

    /// Applies a raw feature token to a single user.
    pub fn update_feature(&mut self, id: &str, token: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        self.nodes[idx.as_usize()].features.update(token)
    }

    /// Applies `update` to every user in `idxs`.
    pub(crate) fn apply_update(&mut self, idxs: &[NodeIdx], update: &FeatureUpdate) {
        for idx in idxs {
            self.nodes[idx.as_usize()].features.apply(update);
        }
    }

    /// Replaces a user's feature set wholesale. Used by the loader.
    pub(crate) fn set_features(&mut self, idx: NodeIdx, features: FeatureSet) {
        self.nodes[idx.as_usize()].features = features;
    }
}

impl Default for CoachingGraph {
    fn default() -> Self {
        Self::directed()
    }
}

impl fmt::Display for CoachingGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.directed { "directed" } else { "undirected" };
        write!(
            f,
            "{kind} graph with {} nodes and {} edges",
            self.nodes.len(),
            self.edge_count
        )
    }
}
