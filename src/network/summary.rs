//! Structural summary of a co-mention graph: size, degrees and centralities

use std::collections::BTreeMap;

use rustworkx_core::centrality::betweenness_centrality;
use rustworkx_core::petgraph::algo::dijkstra;
use serde::{Deserialize, Serialize};

use crate::network::graph::CoMentionGraph;

/// Node counts above this are handled by rustworkx's parallel betweenness
const BETWEENNESS_PARALLEL_THRESHOLD: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub edges: usize,
    pub average_degree: f64,
    /// Unweighted degree per person
    pub degree_distribution: BTreeMap<String, usize>,
    /// Degree / (n - 1)
    pub degree_centrality: BTreeMap<String, f64>,
    /// Normalized shortest-path betweenness, endpoints excluded
    pub betweenness_centrality: BTreeMap<String, f64>,
    /// Wasserman-Faust closeness over unweighted shortest paths
    pub closeness_centrality: BTreeMap<String, f64>,
}

impl NetworkSummary {
    pub fn from_graph(graph: &CoMentionGraph) -> Self {
        let nodes = graph.node_count();
        let edges = graph.edge_count();
        if nodes == 0 {
            return Self::default();
        }

        let raw = graph.raw_graph();
        let scale = if nodes > 1 { 1.0 / (nodes - 1) as f64 } else { 0.0 };

        let mut degree_distribution = BTreeMap::new();
        let mut degree_centrality = BTreeMap::new();
        for name in graph.names() {
            let degree = graph.degree(name);
            degree_distribution.insert(name.to_string(), degree);
            degree_centrality.insert(name.to_string(), degree as f64 * scale);
        }

        let betweenness = betweenness_centrality(raw, false, true, BETWEENNESS_PARALLEL_THRESHOLD);
        let betweenness_centrality = raw
            .node_indices()
            .map(|idx| (raw[idx].clone(), betweenness[idx.index()].unwrap_or(0.0)))
            .collect();

        let closeness_centrality = raw
            .node_indices()
            .map(|idx| {
                let distances = dijkstra(raw, idx, None, |_| 1usize);
                let reachable = distances.len() - 1;
                let total: usize = distances.values().sum();
                let closeness = if total > 0 {
                    let base = reachable as f64 / total as f64;
                    base * reachable as f64 * scale
                } else {
                    0.0
                };
                (raw[idx].clone(), closeness)
            })
            .collect();

        Self {
            nodes,
            edges,
            average_degree: 2.0 * edges as f64 / nodes as f64,
            degree_distribution,
            degree_centrality,
            betweenness_centrality,
            closeness_centrality,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
