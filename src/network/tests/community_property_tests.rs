//! Property tests for community detection over random weighted graphs

use proptest::prelude::*;
use std::collections::BTreeSet;

use crate::config::CommunityConfig;
use crate::network::community::CommunityDetector;
use crate::network::graph::{CoMentionEdge, CoMentionGraph};

// ============================================================================
// Strategies
// ============================================================================

fn weighted_graph() -> impl Strategy<Value = CoMentionGraph> {
    prop::collection::btree_map((0u8..12, 0u8..12), 1u32..30, 0..40).prop_map(|pairs| {
        let edges: Vec<CoMentionEdge> = pairs
            .into_iter()
            .filter(|((a, b), _)| a != b)
            .map(|((a, b), w)| CoMentionEdge::new(format!("N{:02}", a), format!("N{:02}", b), w))
            .collect();

        // (a, b) and (b, a) may both appear; keep the first
        let mut seen = BTreeSet::new();
        let unique: Vec<CoMentionEdge> = edges
            .into_iter()
            .filter(|e| seen.insert((e.u.clone(), e.v.clone())))
            .collect();
        CoMentionGraph::from_edges(unique)
    })
}

fn small_config() -> CommunityConfig {
    CommunityConfig {
        runs: 4,
        ..CommunityConfig::default()
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No person appears in two communities.
    #[test]
    fn communities_are_disjoint(graph in weighted_graph()) {
        let detector = CommunityDetector::new(small_config()).unwrap();
        let mut seen = BTreeSet::new();
        for community in detector.detect(&graph) {
            for member in community.members {
                prop_assert!(seen.insert(member));
            }
        }
    }

    /// Emitted communities are well-formed and ordered by density then size.
    #[test]
    fn communities_are_well_formed(graph in weighted_graph(), top_k in 1usize..4) {
        let config = CommunityConfig { top_k, ..small_config() };
        let communities = CommunityDetector::new(config).unwrap().detect(&graph);
        prop_assert!(communities.len() <= top_k);

        for community in &communities {
            prop_assert_eq!(community.size, community.members.len());
            prop_assert!(graph.contains(&community.seed));
            let internal: u64 = graph
                .edge_list()
                .iter()
                .filter(|e| community.members.contains(&e.u) && community.members.contains(&e.v))
                .map(|e| u64::from(e.weight))
                .sum();
            prop_assert_eq!(community.internal_edges, internal);
        }

        for pair in communities.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.density() > b.density() || (a.density() == b.density() && a.size >= b.size)
            );
        }
    }

    /// Same seed, same graph, same communities.
    #[test]
    fn detection_is_deterministic(graph in weighted_graph(), seed in any::<u64>()) {
        let config = CommunityConfig { seed, ..small_config() };
        let detector = CommunityDetector::new(config).unwrap();
        prop_assert_eq!(detector.detect(&graph), detector.detect(&graph));
    }
}
