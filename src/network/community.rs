//! CommunityDetector - randomized multi-trial partitioning with cohesion filtering
//!
//! Each trial shuffles the sorted edge list, keeps edges at or above the
//! weight threshold, partitions the resulting subgraph and scores it by
//! modularity at resolution 1. The best-scoring trial's communities are then
//! refined against the full graph:
//!
//! - nodes claimed by an earlier community are removed
//! - members whose cohesion (share of weighted degree inside the candidate)
//!   is below the ratio are dropped
//! - members with fewer than two neighbours left in the community are dropped
//!
//! All randomness comes from one `ChaCha8Rng` seeded from the config.

use std::collections::{BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustworkx_core::petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::CommunityConfig;
use crate::error::Result;
use crate::network::graph::{CoMentionEdge, CoMentionGraph};
use crate::network::louvain::{modularity, Louvain, Partitioner};

/// Trial seeds are drawn from `0..TRIAL_SEED_RANGE`
const TRIAL_SEED_RANGE: u64 = 1_000_000;

/// Guards the cohesion ratio against isolated members
const COHESION_EPSILON: f64 = 1e-9;

// =============================================================================
// Types
// =============================================================================

/// A detected social group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Highest weighted-degree member of the candidate before filtering
    pub seed: String,
    pub members: BTreeSet<String>,
    pub size: usize,
    /// Total weight of edges with both endpoints in `members`
    pub internal_edges: u64,
}

impl Community {
    /// Internal edge weight per member
    pub fn density(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.internal_edges as f64 / self.size as f64
        }
    }
}

/// Winning trial of a detection run
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub run: usize,
    /// Modularity at resolution 1 on the trial subgraph
    pub score: f64,
    /// Candidate communities in label order
    pub communities: Vec<Vec<String>>,
}

struct TrialPlan {
    run: usize,
    edges: Vec<CoMentionEdge>,
    seed: u64,
}

// =============================================================================
// Detector
// =============================================================================

#[derive(Debug, Clone)]
pub struct CommunityDetector<P = Louvain> {
    config: CommunityConfig,
    partitioner: P,
}

impl Default for CommunityDetector<Louvain> {
    fn default() -> Self {
        Self {
            config: CommunityConfig::default(),
            partitioner: Louvain,
        }
    }
}

impl CommunityDetector<Louvain> {
    pub fn new(config: CommunityConfig) -> Result<Self> {
        Self::with_partitioner(config, Louvain)
    }
}

impl<P: Partitioner + Sync> CommunityDetector<P> {
    pub fn with_partitioner(config: CommunityConfig, partitioner: P) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, partitioner })
    }

    pub fn config(&self) -> &CommunityConfig {
        &self.config
    }

    /// Ranked, disjoint communities of `graph`
    pub fn detect(&self, graph: &CoMentionGraph) -> Vec<Community> {
        let Some(best) = self.best_trial(graph) else {
            log::debug!("no edge reaches weight {}; no communities", self.config.weight_threshold);
            return Vec::new();
        };

        log::debug!(
            "best trial {} of {}: modularity {:.4}, {} candidates",
            best.run,
            self.config.runs,
            best.score,
            best.communities.len()
        );

        let mut communities = self.refine(graph, &best.communities);
        communities.sort_by(|a, b| {
            b.density()
                .total_cmp(&a.density())
                .then_with(|| b.size.cmp(&a.size))
        });
        communities
    }

    /// Run every trial and keep the strictly best score (earliest run on ties).
    /// `None` when no edge reaches the weight threshold.
    pub fn best_trial(&self, graph: &CoMentionGraph) -> Option<TrialOutcome> {
        let sorted = graph.edge_list();
        if !sorted.iter().any(|e| e.weight >= self.config.weight_threshold) {
            return None;
        }

        let plans = self.plan_trials(&sorted);

        #[cfg(feature = "parallel")]
        let outcomes: Vec<TrialOutcome> = plans.par_iter().map(|plan| self.run_trial(plan)).collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<TrialOutcome> = plans.iter().map(|plan| self.run_trial(plan)).collect();

        let mut best: Option<TrialOutcome> = None;
        for outcome in outcomes {
            log::debug!("trial {}: modularity {:.6}", outcome.run, outcome.score);
            if best.as_ref().map_or(true, |b| outcome.score > b.score) {
                best = Some(outcome);
            }
        }
        best
    }

    /// Draw every trial's shuffle and partition seed from the one generator,
    /// in run order.
    fn plan_trials(&self, sorted: &[CoMentionEdge]) -> Vec<TrialPlan> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        (0..self.config.runs)
            .map(|run| {
                let mut edges = sorted.to_vec();
                edges.shuffle(&mut rng);
                let seed = rng.gen_range(0..TRIAL_SEED_RANGE);
                TrialPlan { run, edges, seed }
            })
            .collect()
    }

    fn run_trial(&self, plan: &TrialPlan) -> TrialOutcome {
        let subgraph = trial_subgraph(&plan.edges, self.config.weight_threshold);
        let mut rng = ChaCha8Rng::seed_from_u64(plan.seed);
        let labels = self
            .partitioner
            .partition(&subgraph, self.config.resolution, &mut rng);
        let score = modularity(&subgraph, &labels, 1.0);

        let mut communities: Vec<Vec<String>> = Vec::new();
        let mut slot: HashMap<usize, usize> = HashMap::new();
        for (node, &label) in labels.iter().enumerate() {
            let i = *slot.entry(label).or_insert_with(|| {
                communities.push(Vec::new());
                communities.len() - 1
            });
            communities[i].push(subgraph[NodeIndex::new(node)].clone());
        }

        TrialOutcome {
            run: plan.run,
            score,
            communities,
        }
    }

    /// Claim, cohesion and connectivity filtering against the full graph
    fn refine(&self, graph: &CoMentionGraph, candidates: &[Vec<String>]) -> Vec<Community> {
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        let mut accepted = Vec::new();

        for candidate in candidates {
            let members: BTreeSet<&str> = candidate
                .iter()
                .map(String::as_str)
                .filter(|m| !claimed.contains(*m))
                .collect();
            if members.is_empty() {
                continue;
            }

            // BTreeSet order + strict comparison: smallest name wins ties
            let mut seed = "";
            let mut seed_degree = None;
            for &member in &members {
                let degree = graph.weighted_degree(member);
                if seed_degree.map_or(true, |best| degree > best) {
                    seed = member;
                    seed_degree = Some(degree);
                }
            }

            let cohesive: BTreeSet<&str> = members
                .iter()
                .copied()
                .filter(|&member| cohesion(graph, member, &members) >= self.config.cohesion_ratio)
                .collect();

            let connected: BTreeSet<&str> = cohesive
                .iter()
                .copied()
                .filter(|&member| {
                    graph
                        .neighbors(member)
                        .iter()
                        .filter(|(other, _)| cohesive.contains(other))
                        .count()
                        >= 2
                })
                .collect();

            if !connected.is_empty() {
                let internal_edges = internal_weight(graph, &connected);
                let members: BTreeSet<String> = connected.iter().map(|m| m.to_string()).collect();
                claimed.extend(members.iter().cloned());
                accepted.push(Community {
                    seed: seed.to_string(),
                    size: members.len(),
                    members,
                    internal_edges,
                });
            }

            if accepted.len() >= self.config.top_k {
                break;
            }
        }

        accepted
    }
}

/// Subgraph of the edges at or above `threshold`, nodes in first-appearance order
fn trial_subgraph(edges: &[CoMentionEdge], threshold: u32) -> UnGraph<String, f64> {
    let mut graph = UnGraph::new_undirected();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for edge in edges.iter().filter(|e| e.weight >= threshold) {
        let u = *index
            .entry(edge.u.as_str())
            .or_insert_with(|| graph.add_node(edge.u.clone()));
        let v = *index
            .entry(edge.v.as_str())
            .or_insert_with(|| graph.add_node(edge.v.clone()));
        graph.add_edge(u, v, f64::from(edge.weight));
    }
    graph
}

/// Share of `member`'s weighted degree that stays inside `members`
fn cohesion(graph: &CoMentionGraph, member: &str, members: &BTreeSet<&str>) -> f64 {
    let (mut internal, mut external) = (0u64, 0u64);
    for (other, weight) in graph.neighbors(member) {
        if members.contains(&other) {
            internal += u64::from(weight);
        } else {
            external += u64::from(weight);
        }
    }
    internal as f64 / (internal as f64 + external as f64 + COHESION_EPSILON)
}

fn internal_weight(graph: &CoMentionGraph, members: &BTreeSet<&str>) -> u64 {
    graph
        .edge_list()
        .iter()
        .filter(|e| members.contains(&e.u.as_str()) && members.contains(&e.v.as_str()))
        .map(|e| u64::from(e.weight))
        .sum()
}

// =============================================================================
// Tests
// =============================================================================
