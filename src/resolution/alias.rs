//! AliasMerger - greedy per-article alias grouping
//!
//! Names are visited longest first. Each unclaimed name becomes the canonical
//! form of a new group and claims every later unclaimed name scoring at or
//! above the threshold against it. Longest-first means "Anna Hansen" absorbs
//! "Anna" instead of the other way round.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{ResolutionConfig, SimilarityScorer};

/// One person inside one article: the canonical (longest) name plus every
/// name merged into it, canonical included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub canonical: String,
    pub members: Vec<String>,
}

impl AliasGroup {
    fn new(canonical: &str) -> Self {
        Self {
            canonical: canonical.to_string(),
            members: vec![canonical.to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct AliasMerger {
    threshold: u8,
    scorer: SimilarityScorer,
}

impl Default for AliasMerger {
    fn default() -> Self {
        Self::from_config(&ResolutionConfig::default())
    }
}

impl AliasMerger {
    pub fn new(threshold: u8, scorer: SimilarityScorer) -> Self {
        Self { threshold, scorer }
    }

    pub fn from_config(config: &ResolutionConfig) -> Self {
        Self::new(config.similarity_threshold, config.scorer)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Partition one article's names into alias groups.
    ///
    /// Duplicates collapse to their first occurrence and names without any
    /// letter are skipped. Equal-length names keep their input order, so the
    /// grouping is a pure function of the input sequence.
    pub fn merge(&self, names: &[String]) -> Vec<AliasGroup> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut ordered: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| name.chars().any(char::is_alphabetic))
            .filter(|name| seen.insert(*name))
            .collect();

        // Stable: ties stay in first-appearance order
        ordered.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));

        let threshold = f64::from(self.threshold);
        let mut consumed = vec![false; ordered.len()];
        let mut groups = Vec::new();

        for i in 0..ordered.len() {
            if consumed[i] {
                continue;
            }
            consumed[i] = true;

            let mut group = AliasGroup::new(ordered[i]);
            for j in (i + 1)..ordered.len() {
                if consumed[j] {
                    continue;
                }
                if self.scorer.score(ordered[i], ordered[j]) >= threshold {
                    consumed[j] = true;
                    group.members.push(ordered[j].to_string());
                }
            }
            groups.push(group);
        }

        groups
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_name_joins_full_name() {
        let merger = AliasMerger::default();
        let groups = merger.merge(&names(&["Anna", "Anna Hansen", "Peter Jensen"]));

        // Longest first: "Peter Jensen" (12 chars) opens the first group
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].canonical, "Peter Jensen");
        assert_eq!(groups[0].members, vec!["Peter Jensen"]);
        assert_eq!(groups[1].canonical, "Anna Hansen");
        assert_eq!(groups[1].members, vec!["Anna Hansen", "Anna"]);
    }

    #[test]
    fn test_canonical_is_longest_member() {
        let merger = AliasMerger::default();
        for group in merger.merge(&names(&["Hansen", "Anna", "Anna Hansen", "Jensen"])) {
            let longest = group.members.iter().map(|m| m.chars().count()).max().unwrap();
            assert_eq!(group.canonical.chars().count(), longest);
            assert!(group.members.contains(&group.canonical));
        }
    }

    #[test]
    fn test_duplicates_collapse() {
        let merger = AliasMerger::default();
        let groups = merger.merge(&names(&["Peter Jensen", "Peter Jensen", "Peter Jensen"]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec!["Peter Jensen"]);
    }

    #[test]
    fn test_empty_and_letterless_names_skipped() {
        let merger = AliasMerger::default();
        assert!(merger.merge(&[]).is_empty());
        assert!(merger.merge(&names(&["", "  ", "42", "--"])).is_empty());
    }

    #[test]
    fn test_equal_length_ties_keep_input_order() {
        let merger = AliasMerger::new(100, SimilarityScorer::WeightedRatio);
        let groups = merger.merge(&names(&["Bo", "Al", "Ib"]));
        let canon: Vec<&str> = groups.iter().map(|g| g.canonical.as_str()).collect();
        assert_eq!(canon, vec!["Bo", "Al", "Ib"]);
    }

    #[test]
    fn test_every_name_in_exactly_one_group() {
        let merger = AliasMerger::default();
        let input = names(&["Anna", "Anna Hansen", "Hansen", "Mette", "Mette Frederiksen", "Bo"]);
        let groups = merger.merge(&input);

        let mut all: Vec<&String> = groups.iter().flat_map(|g| g.members.iter()).collect();
        all.sort();
        let mut expected: Vec<&String> = input.iter().collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_threshold_zero_merges_everything() {
        let merger = AliasMerger::new(0, SimilarityScorer::WeightedRatio);
        let groups = merger.merge(&names(&["Anna Hansen", "Peter Jensen", "Bo"]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 3);
    }

    #[test]
    fn test_jaro_winkler_scorer() {
        let merger = AliasMerger::new(90, SimilarityScorer::JaroWinkler);
        let groups = merger.merge(&names(&["Frederiksen", "Fredriksen", "Jensen"]));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["Frederiksen", "Fredriksen"]);
    }
}
