//! Property tests for co-mention graph construction and pruning

use proptest::prelude::*;
use std::collections::BTreeSet;

use crate::network::graph::CoMentionGraph;
use crate::resolution::aggregate::{PersonRecord, PersonTable};

// ============================================================================
// Strategies
// ============================================================================

/// Up to 12 people, each mentioned in a subset of 10 articles
fn person_table() -> impl Strategy<Value = PersonTable> {
    prop::collection::vec(prop::collection::btree_set(0u8..10, 1..8), 0..12).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, articles)| {
                PersonRecord::with_articles(
                    format!("Person {:02}", i),
                    articles.into_iter().map(|a| format!("Art{}", a)),
                )
            })
            .collect()
    })
}

fn shared(table: &PersonTable, a: &str, b: &str) -> usize {
    let (a, b) = (table.get(a).unwrap(), table.get(b).unwrap());
    a.article_ids.intersection(&b.article_ids).count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Edge weight is exactly the shared-article count; no edge without overlap.
    #[test]
    fn weights_match_intersections(table in person_table()) {
        let graph = CoMentionGraph::from_table(&table);
        prop_assert_eq!(graph.node_count(), table.len());

        let names: Vec<&str> = table.iter().map(|r| r.canonical_name.as_str()).collect();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                let expected = shared(&table, a, b);
                match graph.weight(a, b) {
                    Some(w) => prop_assert_eq!(w as usize, expected),
                    None => prop_assert_eq!(expected, 0),
                }
            }
        }
    }

    /// After pruning: every edge is above the floor, and nothing that was a
    /// leaf of the floor-filtered graph survives.
    #[test]
    fn pruning_removes_weak_edges_and_leaves(table in person_table(), floor in 0u32..4) {
        let raw = CoMentionGraph::from_table(&table);
        let pruned = raw.prune(floor);

        prop_assert!(pruned.edge_list().iter().all(|e| e.weight > floor));

        let filtered = CoMentionGraph::from_edges(
            raw.edge_list().into_iter().filter(|e| e.weight > floor).collect(),
        );
        for name in pruned.names() {
            prop_assert!(filtered.degree(name) >= 2, "{} was a leaf", name);
            prop_assert!(pruned.degree(name) >= 1, "{} is isolated", name);
        }

        let kept: BTreeSet<&str> = pruned.names().collect();
        for edge in pruned.edge_list() {
            prop_assert!(kept.contains(edge.u.as_str()) && kept.contains(edge.v.as_str()));
            prop_assert_eq!(Some(edge.weight), raw.weight(&edge.u, &edge.v));
        }
    }

    /// Building twice gives the same edge list.
    #[test]
    fn build_is_deterministic(table in person_table()) {
        prop_assert_eq!(
            CoMentionGraph::build(&table, 1).edge_list(),
            CoMentionGraph::build(&table, 1).edge_list()
        );
    }
}
