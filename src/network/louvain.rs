//! Louvain modularity optimization
//!
//! Multi-level greedy modularity maximization: nodes move between
//! neighbouring communities while modularity improves, communities are then
//! collapsed into super-nodes and the process repeats until a level brings no
//! improvement. Node visiting order and candidate-community order are
//! shuffled with the caller's generator, so the result is a pure function of
//! the graph, the resolution and the generator state.
//!
//! Partitioning sits behind [`Partitioner`] so the community detector can run
//! any modularity optimizer with the same seeding contract.

use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rustworkx_core::petgraph::graph::UnGraph;
use rustworkx_core::petgraph::visit::EdgeRef;

/// Improvements below this are treated as convergence
const MIN_GAIN: f64 = 1e-7;

/// Modularity-optimizing partitioner
pub trait Partitioner {
    /// Community label per node, indexed by `NodeIndex::index()`.
    /// Labels are dense (`0..k`).
    fn partition(&self, graph: &UnGraph<String, f64>, resolution: f64, rng: &mut ChaCha8Rng)
        -> Vec<usize>;
}

/// Classic two-phase Louvain
#[derive(Debug, Clone, Copy, Default)]
pub struct Louvain;

impl Partitioner for Louvain {
    fn partition(
        &self,
        graph: &UnGraph<String, f64>,
        resolution: f64,
        rng: &mut ChaCha8Rng,
    ) -> Vec<usize> {
        let n = graph.node_count();
        let edges: Vec<(usize, usize, f64)> = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();

        if edges.is_empty() {
            return (0..n).collect();
        }

        let dendrogram = build_dendrogram(Level::new(n, &edges), resolution, rng);

        // Compose levels: node -> community at level 0 -> ... -> top
        let mut labels: Vec<usize> = (0..n).collect();
        for level in &dendrogram {
            for label in labels.iter_mut() {
                *label = level[*label];
            }
        }
        labels
    }
}

// =============================================================================
// Levels
// =============================================================================

/// One level of the aggregated graph
#[derive(Debug, Clone)]
struct Level {
    /// Neighbours (self loops excluded) with edge weight
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight per node
    loops: Vec<f64>,
    /// Weighted degree, self loops counted twice
    degree: Vec<f64>,
    /// Sum of edge weights, self loops counted once
    total_weight: f64,
}

impl Level {
    fn new(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut level = Self {
            adjacency: vec![Vec::new(); n],
            loops: vec![0.0; n],
            degree: vec![0.0; n],
            total_weight: 0.0,
        };

        for &(a, b, w) in edges {
            level.total_weight += w;
            if a == b {
                level.loops[a] += w;
                level.degree[a] += 2.0 * w;
            } else {
                level.adjacency[a].push((b, w));
                level.adjacency[b].push((a, w));
                level.degree[a] += w;
                level.degree[b] += w;
            }
        }
        level
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Collapse each community into one node; intra-community weight becomes
    /// a self loop.
    fn induced(&self, labels: &[usize], communities: usize) -> Self {
        let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for (node, &w) in self.loops.iter().enumerate() {
            if w > 0.0 {
                let c = labels[node];
                *merged.entry((c, c)).or_insert(0.0) += w;
            }
        }
        for (a, neighbors) in self.adjacency.iter().enumerate() {
            for &(b, w) in neighbors {
                // Each undirected edge appears twice in the adjacency
                if a < b {
                    let (ca, cb) = (labels[a], labels[b]);
                    let key = if ca <= cb { (ca, cb) } else { (cb, ca) };
                    *merged.entry(key).or_insert(0.0) += w;
                }
            }
        }

        let edges: Vec<(usize, usize, f64)> = merged.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        Self::new(communities, &edges)
    }
}

/// Per-level community bookkeeping
struct Status {
    node_to_community: Vec<usize>,
    /// Total degree per community
    community_degree: Vec<f64>,
    /// Internal weight per community (each edge once)
    community_internal: Vec<f64>,
}

impl Status {
    fn singletons(level: &Level) -> Self {
        Self {
            node_to_community: (0..level.len()).collect(),
            community_degree: level.degree.clone(),
            community_internal: level.loops.clone(),
        }
    }

    fn modularity(&self, level: &Level, resolution: f64) -> f64 {
        let m = level.total_weight;
        if m <= 0.0 {
            return 0.0;
        }
        self.community_internal
            .iter()
            .zip(&self.community_degree)
            .map(|(&internal, &degree)| internal / m - resolution * (degree / (2.0 * m)).powi(2))
            .sum()
    }

    fn remove(&mut self, level: &Level, node: usize, community: usize, weight_to_community: f64) {
        self.community_degree[community] -= level.degree[node];
        self.community_internal[community] -= weight_to_community + level.loops[node];
    }

    fn insert(&mut self, level: &Level, node: usize, community: usize, weight_to_community: f64) {
        self.node_to_community[node] = community;
        self.community_degree[community] += level.degree[node];
        self.community_internal[community] += weight_to_community + level.loops[node];
    }

    /// Weight from `node` to each neighbouring community, first-seen order
    fn neighbor_communities(&self, level: &Level, node: usize) -> Vec<(usize, f64)> {
        let mut order: Vec<(usize, f64)> = Vec::new();
        let mut slot: HashMap<usize, usize> = HashMap::new();
        for &(neighbor, w) in &level.adjacency[node] {
            let community = self.node_to_community[neighbor];
            match slot.get(&community) {
                Some(&i) => order[i].1 += w,
                None => {
                    slot.insert(community, order.len());
                    order.push((community, w));
                }
            }
        }
        order
    }

    /// Dense labels numbered by first appearance in node order
    fn renumbered(&self) -> (Vec<usize>, usize) {
        let mut mapping: HashMap<usize, usize> = HashMap::new();
        let labels = self
            .node_to_community
            .iter()
            .map(|c| {
                let next = mapping.len();
                *mapping.entry(*c).or_insert(next)
            })
            .collect();
        (labels, mapping.len())
    }
}

/// Local moving phase. Returns once a full pass moves nothing or gains less
/// than [`MIN_GAIN`].
fn one_level(level: &Level, status: &mut Status, resolution: f64, rng: &mut ChaCha8Rng) {
    let two_m = 2.0 * level.total_weight;
    let mut current = status.modularity(level, resolution);
    let mut order: Vec<usize> = (0..level.len()).collect();

    loop {
        let mut moved = false;
        order.shuffle(rng);

        for &node in &order {
            let home = status.node_to_community[node];
            let degree_share = level.degree[node] / two_m;

            let mut neighbors = status.neighbor_communities(level, node);
            let weight_home = neighbors
                .iter()
                .find(|(c, _)| *c == home)
                .map_or(0.0, |(_, w)| *w);

            let remove_cost = -weight_home
                + resolution * (status.community_degree[home] - level.degree[node]) * degree_share;
            status.remove(level, node, home, weight_home);

            neighbors.shuffle(rng);
            let mut best = home;
            let mut best_gain = 0.0;
            for &(community, weight) in &neighbors {
                let gain = remove_cost + weight
                    - resolution * status.community_degree[community] * degree_share;
                if gain > best_gain {
                    best_gain = gain;
                    best = community;
                }
            }

            let weight_best = neighbors
                .iter()
                .find(|(c, _)| *c == best)
                .map_or(0.0, |(_, w)| *w);
            status.insert(level, node, best, weight_best);
            moved |= best != home;
        }

        let updated = status.modularity(level, resolution);
        if !moved || updated - current < MIN_GAIN {
            break;
        }
        current = updated;
    }
}

/// Run levels until one brings no modularity gain; returns the relabeling
/// applied at each level.
fn build_dendrogram(first: Level, resolution: f64, rng: &mut ChaCha8Rng) -> Vec<Vec<usize>> {
    let mut dendrogram = Vec::new();
    let mut level = first;

    let mut status = Status::singletons(&level);
    one_level(&level, &mut status, resolution, rng);
    let mut modularity = status.modularity(&level, resolution);
    let (labels, count) = status.renumbered();
    level = level.induced(&labels, count);
    dendrogram.push(labels);

    loop {
        let mut status = Status::singletons(&level);
        one_level(&level, &mut status, resolution, rng);
        let updated = status.modularity(&level, resolution);
        if updated - modularity < MIN_GAIN {
            break;
        }
        modularity = updated;
        let (labels, count) = status.renumbered();
        level = level.induced(&labels, count);
        dendrogram.push(labels);
    }

    dendrogram
}

// =============================================================================
// Scoring
// =============================================================================

/// Weighted Newman modularity of a labeling at the given resolution:
/// `sum_c [ L_c / m - resolution * (d_c / 2m)^2 ]`. Zero for an edgeless graph.
pub fn modularity(graph: &UnGraph<String, f64>, labels: &[usize], resolution: f64) -> f64 {
    let m: f64 = graph.edge_references().map(|e| *e.weight()).sum();
    if m <= 0.0 {
        return 0.0;
    }

    // Ordered maps keep the float summation order fixed
    let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<usize, f64> = BTreeMap::new();

    for e in graph.edge_references() {
        let (a, b, w) = (e.source().index(), e.target().index(), *e.weight());
        *degree.entry(labels[a]).or_insert(0.0) += w;
        *degree.entry(labels[b]).or_insert(0.0) += w;
        if labels[a] == labels[b] {
            *internal.entry(labels[a]).or_insert(0.0) += w;
        }
    }

    degree
        .iter()
        .map(|(c, d)| internal.get(c).copied().unwrap_or(0.0) / m - resolution * (d / (2.0 * m)).powi(2))
        .sum()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Two 4-cliques joined by one weak bridge
    fn two_cliques() -> UnGraph<String, f64> {
        let mut g = UnGraph::new_undirected();
        let nodes: Vec<_> = (0..8).map(|i| g.add_node(format!("p{}", i))).collect();
        for block in [0usize, 4] {
            for i in block..block + 4 {
                for j in (i + 1)..block + 4 {
                    g.add_edge(nodes[i], nodes[j], 10.0);
                }
            }
        }
        g.add_edge(nodes[3], nodes[4], 1.0);
        g
    }

    #[test]
    fn test_separates_cliques() {
        let g = two_cliques();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let labels = Louvain.partition(&g, 1.0, &mut rng);

        assert_eq!(labels.len(), 8);
        assert!(labels[..4].iter().all(|&l| l == labels[0]));
        assert!(labels[4..].iter().all(|&l| l == labels[4]));
        assert_ne!(labels[0], labels[4]);
    }

    #[test]
    fn test_labels_are_dense() {
        let g = two_cliques();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let labels = Louvain.partition(&g, 1.0, &mut rng);
        let max = *labels.iter().max().unwrap();
        for label in 0..=max {
            assert!(labels.contains(&label));
        }
    }

    #[test]
    fn test_same_seed_same_partition() {
        let g = two_cliques();
        let a = Louvain.partition(&g, 1.5, &mut ChaCha8Rng::seed_from_u64(99));
        let b = Louvain.partition(&g, 1.5, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_edgeless_graph_is_singletons() {
        let mut g: UnGraph<String, f64> = UnGraph::new_undirected();
        g.add_node("a".into());
        g.add_node("b".into());
        let labels = Louvain.partition(&g, 1.0, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_modularity_values() {
        let g = two_cliques();
        let split = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let lumped = vec![0; 8];

        assert!(modularity(&g, &split, 1.0) > 0.4);
        assert!(modularity(&g, &lumped, 1.0).abs() < 1e-12);
        assert!(modularity(&g, &split, 1.0) > modularity(&g, &split, 2.0));
    }

    #[test]
    fn test_partition_beats_trivial_modularity() {
        let g = two_cliques();
        let labels = Louvain.partition(&g, 1.0, &mut ChaCha8Rng::seed_from_u64(3));
        let singletons: Vec<usize> = (0..8).collect();
        assert!(modularity(&g, &labels, 1.0) > modularity(&g, &singletons, 1.0));
    }
}
