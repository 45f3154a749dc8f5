//! Co-mention graph: people as nodes, shared articles as edge weights
//!
//! Built from a [`PersonTable`] by intersecting every pair of article-id sets,
//! then pruned in two fixed passes:
//!
//! 1. drop edges with weight <= floor (nodes left without edges disappear)
//! 2. drop nodes that had exactly one edge after pass 1, then any node left
//!    without edges
//!
//! Pass 2 is not repeated, so a node can end up with degree 1 if its other
//! neighbours were leaves.

use std::collections::{BTreeSet, HashMap};

use lasso::{Key, Rodeo};
use rustworkx_core::petgraph::graph::{NodeIndex, UnGraph};
use rustworkx_core::petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::resolution::aggregate::PersonTable;

// =============================================================================
// Types
// =============================================================================

/// Undirected weighted edge, endpoints stored with `u < v`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoMentionEdge {
    pub u: String,
    pub v: String,
    pub weight: u32,
}

impl CoMentionEdge {
    pub fn new(a: impl Into<String>, b: impl Into<String>, weight: u32) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { u: a, v: b, weight }
        } else {
            Self { u: b, v: a, weight }
        }
    }
}

/// Weighted undirected person graph
#[derive(Debug, Clone, Default)]
pub struct CoMentionGraph {
    graph: UnGraph<String, u32>,
    /// Fast lookup: canonical name -> petgraph NodeIndex
    id_to_index: HashMap<String, NodeIndex>,
}

// =============================================================================
// Construction
// =============================================================================

impl CoMentionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes plus edges; edge endpoints missing from
    /// `nodes` are added on demand.
    pub fn from_parts<I, S>(nodes: I, edges: impl IntoIterator<Item = CoMentionEdge>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.ensure_node(node.into());
        }
        for edge in edges {
            let u = graph.ensure_node(edge.u);
            let v = graph.ensure_node(edge.v);
            graph.graph.add_edge(u, v, edge.weight);
        }
        graph
    }

    /// Graph whose node set is exactly the edge endpoints, in name order
    pub fn from_edges(edges: Vec<CoMentionEdge>) -> Self {
        let nodes: BTreeSet<String> = edges
            .iter()
            .flat_map(|e| [e.u.clone(), e.v.clone()])
            .collect();
        Self::from_parts(nodes, edges)
    }

    fn ensure_node(&mut self, name: String) -> NodeIndex {
        if let Some(&idx) = self.id_to_index.get(&name) {
            return idx;
        }
        let idx = self.graph.add_node(name.clone());
        self.id_to_index.insert(name, idx);
        idx
    }

    /// Unpruned co-mention graph: every person is a node, every pair sharing
    /// at least one article is an edge weighted by the shared-article count.
    pub fn from_table(table: &PersonTable) -> Self {
        let names: Vec<&str> = table.iter().map(|r| r.canonical_name.as_str()).collect();

        let mut interner = Rodeo::default();
        let article_sets: Vec<Vec<usize>> = table
            .iter()
            .map(|record| {
                let mut ids: Vec<usize> = record
                    .article_ids
                    .iter()
                    .map(|id| interner.get_or_intern(id).into_usize())
                    .collect();
                ids.sort_unstable();
                ids
            })
            .collect();

        let edges = pair_weights(&article_sets);
        log::debug!(
            "co-mention graph: {} people, {} weighted pairs",
            names.len(),
            edges.len()
        );

        Self::from_parts(
            names.iter().copied(),
            edges
                .into_iter()
                .map(|(i, j, w)| CoMentionEdge::new(names[i], names[j], w)),
        )
    }

    /// Full build: pair weights, then the two pruning passes
    pub fn build(table: &PersonTable, prune_floor: u32) -> Self {
        Self::from_table(table).prune(prune_floor)
    }

    /// Two-pass structural pruning, see module docs
    pub fn prune(&self, floor: u32) -> Self {
        let strong: Vec<CoMentionEdge> = self
            .edge_list()
            .into_iter()
            .filter(|e| e.weight > floor)
            .collect();
        let filtered = Self::from_edges(strong);

        let leaves: BTreeSet<&str> = filtered
            .names()
            .filter(|name| filtered.degree(name) == 1)
            .collect();

        let kept: Vec<CoMentionEdge> = filtered
            .edge_list()
            .into_iter()
            .filter(|e| !leaves.contains(e.u.as_str()) && !leaves.contains(e.v.as_str()))
            .collect();

        let pruned = Self::from_edges(kept);
        log::debug!(
            "pruned co-mention graph: {}/{} nodes, {}/{} edges kept (floor {}, {} leaves)",
            pruned.node_count(),
            self.node_count(),
            pruned.edge_count(),
            self.edge_count(),
            floor,
            leaves.len()
        );
        pruned
    }
}

/// Shared-element counts for every pair `i < j` of sorted id lists, in row
/// order. Rows are sharded across the rayon pool when enabled.
fn pair_weights(sets: &[Vec<usize>]) -> Vec<(usize, usize, u32)> {
    let n = sets.len();
    let row = move |i: usize| {
        (i + 1..n).filter_map(move |j| {
            let shared = sorted_intersection_len(&sets[i], &sets[j]);
            (shared > 0).then_some((i, j, shared))
        })
    };

    #[cfg(feature = "parallel")]
    {
        (0..n).into_par_iter().flat_map_iter(row).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..n).flat_map(row).collect()
    }
}

fn sorted_intersection_len(a: &[usize], b: &[usize]) -> u32 {
    let (mut i, mut j, mut count) = (0, 0, 0u32);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

// =============================================================================
// Queries
// =============================================================================

impl CoMentionGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.id_to_index.contains_key(name)
    }

    pub fn get_index(&self, name: &str) -> Option<NodeIndex> {
        self.id_to_index.get(name).copied()
    }

    /// Node names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Edge weight between two people, if connected
    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        let (a, b) = (self.get_index(a)?, self.get_index(b)?);
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Number of incident edges (0 for unknown names)
    pub fn degree(&self, name: &str) -> usize {
        self.get_index(name)
            .map(|idx| self.graph.edges(idx).count())
            .unwrap_or(0)
    }

    /// Sum of incident edge weights (0 for unknown names)
    pub fn weighted_degree(&self, name: &str) -> u64 {
        self.get_index(name)
            .map(|idx| self.graph.edges(idx).map(|e| u64::from(*e.weight())).sum())
            .unwrap_or(0)
    }

    /// Neighbours with the connecting edge weight
    pub fn neighbors(&self, name: &str) -> Vec<(&str, u32)> {
        let Some(idx) = self.get_index(name) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (self.graph[other].as_str(), *e.weight())
            })
            .collect()
    }

    /// All edges with `u < v`, sorted by (u, v)
    pub fn edge_list(&self) -> Vec<CoMentionEdge> {
        let mut edges: Vec<CoMentionEdge> = self
            .graph
            .edge_references()
            .map(|e| {
                CoMentionEdge::new(
                    self.graph[e.source()].as_str(),
                    self.graph[e.target()].as_str(),
                    *e.weight(),
                )
            })
            .collect();
        edges.sort();
        edges
    }

    /// Underlying petgraph graph, for algorithms
    pub fn raw_graph(&self) -> &UnGraph<String, u32> {
        &self.graph
    }
}

// =============================================================================
// Tests
// =============================================================================
