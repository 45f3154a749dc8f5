//! Fuzzy name similarity on a 0-100 scale
//!
//! The default scorer is a weighted ratio: it blends a plain edit-based ratio
//! with partial (best substring window) and token-based ratios, scaled by how
//! different the two lengths are. Partial matches are what let a bare first
//! name join its full name:
//!
//! ```
//! use mentiongraph::resolution::similarity::weighted_ratio;
//!
//! assert!(weighted_ratio("Anna", "Anna Hansen") >= 85.0);
//! assert!(weighted_ratio("Anna Hansen", "Peter Jensen") < 85.0);
//! ```
//!
//! Scoring is case-sensitive and applies no preprocessing; names reach the
//! scorer already normalized.

use std::collections::BTreeSet;

use crate::config::SimilarityScorer;

const UNBASE_SCALE: f64 = 0.95;

impl SimilarityScorer {
    /// Score two names, 0 (unrelated) to 100 (identical)
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityScorer::WeightedRatio => weighted_ratio(a, b),
            SimilarityScorer::JaroWinkler => strsim::jaro_winkler(a, b) * 100.0,
        }
    }
}

// =============================================================================
// Base ratios
// =============================================================================

/// Length of the longest common subsequence
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Insertion/deletion distance
fn indel_distance(a: &[char], b: &[char]) -> usize {
    a.len() + b.len() - 2 * lcs_len(a, b)
}

/// Normalized indel similarity, 100 for two empty strings
fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 - 100.0 * indel_distance(a, b) as f64 / total as f64
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best ratio of the shorter string against every window of the longer one,
/// including windows clipped at either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a.len() == b.len() {
        return partial_windows(&a, &b).max(partial_windows(&b, &a));
    }
    if a.len() < b.len() {
        partial_windows(&a, &b)
    } else {
        partial_windows(&b, &a)
    }
}

fn partial_windows(short: &[char], long: &[char]) -> f64 {
    let m = short.len();
    let n = long.len();
    let mut best: f64 = 0.0;

    let mut consider = |window: &[char]| {
        best = best.max(ratio_chars(short, window));
    };

    for i in 1..m {
        consider(&long[..i.min(n)]);
    }
    for start in 0..=n.saturating_sub(m) {
        consider(&long[start..(start + m).min(n)]);
    }
    for start in n.saturating_sub(m) + 1..n {
        consider(&long[start..]);
    }

    best
}

// =============================================================================
// Token ratios
// =============================================================================

fn sorted_join<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tokens: Vec<&str> = tokens.into_iter().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(
        &sorted_join(a.split_whitespace()),
        &sorted_join(b.split_whitespace()),
    )
}

/// Compares the shared tokens against each side's leftovers
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    // BTreeSet iteration is already sorted
    let diff_ab: Vec<char> = diff_ab.join(" ").chars().collect();
    let diff_ba: Vec<char> = diff_ba.join(" ").chars().collect();
    let sect_len = intersection.join(" ").chars().count();
    let separator = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + separator + diff_ab.len();
    let sect_ba_len = sect_len + separator + diff_ba.len();
    let combined = sect_ab_len + sect_ba_len;

    let dist = indel_distance(&diff_ab, &diff_ba);
    let mut result = 100.0 - 100.0 * dist as f64 / combined as f64;

    if sect_len == 0 {
        return result;
    }

    let sect_ab_ratio = 100.0 - 100.0 * (separator + diff_ab.len()) as f64 / (sect_len + sect_ab_len) as f64;
    let sect_ba_ratio = 100.0 - 100.0 * (separator + diff_ba.len()) as f64 / (sect_len + sect_ba_len) as f64;
    result = result.max(sect_ab_ratio).max(sect_ba_ratio);
    result
}

pub fn token_ratio(a: &str, b: &str) -> f64 {
    token_sort_ratio(a, b).max(token_set_ratio(a, b))
}

/// Partial ratio over sorted tokens; any shared token scores 100
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let split_a: Vec<&str> = a.split_whitespace().collect();
    let split_b: Vec<&str> = b.split_whitespace().collect();
    let tokens_a: BTreeSet<&str> = split_a.iter().copied().collect();
    let tokens_b: BTreeSet<&str> = split_b.iter().copied().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    if tokens_a.intersection(&tokens_b).next().is_some() {
        return 100.0;
    }

    let result = partial_ratio(
        &sorted_join(split_a.iter().copied()),
        &sorted_join(split_b.iter().copied()),
    );

    // Without repeated tokens the set view is the same string
    if split_a.len() == tokens_a.len() && split_b.len() == tokens_b.len() {
        return result;
    }

    result.max(partial_ratio(
        &sorted_join(tokens_a.iter().copied()),
        &sorted_join(tokens_b.iter().copied()),
    ))
}

// =============================================================================
// Weighted ratio
// =============================================================================

/// Weighted blend of the ratios above; 0 if either side is empty
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = if len_a > len_b { len_a / len_b } else { len_b / len_a };

    let end_ratio = ratio(a, b);

    if len_ratio < 1.5 {
        return end_ratio.max(token_ratio(a, b) * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    let end_ratio = end_ratio.max(partial_ratio(a, b) * partial_scale);
    end_ratio.max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

// =============================================================================
// Tests
// =============================================================================
