//! GenderInferencer - pronoun majority vote per first name
//!
//! Pronoun evidence is pooled by first name across the whole table: every
//! person contributes the words of all their coreference mentions to each
//! first name found among their aliases. People sharing a first name share a
//! verdict.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::PronounSets;
use crate::resolution::aggregate::PersonTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

/// Masculine/feminine pronoun hits for one first name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PronounTally {
    pub masculine: usize,
    pub feminine: usize,
}

impl PronounTally {
    pub fn verdict(&self) -> Gender {
        match self.masculine.cmp(&self.feminine) {
            std::cmp::Ordering::Greater => Gender::Male,
            std::cmp::Ordering::Less => Gender::Female,
            std::cmp::Ordering::Equal => Gender::Unknown,
        }
    }
}

/// Runs of word characters; apostrophes split, so "hun's" yields "hun"
fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("word pattern is valid"))
}

fn first_name(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

#[derive(Debug, Clone, Default)]
pub struct GenderInferencer {
    pronouns: PronounSets,
}

impl GenderInferencer {
    /// Pronoun tokens are lower-cased here; mention words are matched lower-cased.
    pub fn new(pronouns: PronounSets) -> Self {
        Self {
            pronouns: PronounSets::new(&pronouns.masculine, &pronouns.feminine),
        }
    }

    /// Pooled pronoun counts keyed by first name
    pub fn first_name_tallies(&self, table: &PersonTable) -> BTreeMap<String, PronounTally> {
        let mut tallies: BTreeMap<String, PronounTally> = BTreeMap::new();

        for record in table.iter() {
            let mut person = PronounTally::default();
            for mention in record.coref_mentions() {
                let lowered = mention.to_lowercase();
                for word in word_pattern().find_iter(&lowered).map(|m| m.as_str()) {
                    if self.pronouns.masculine.contains(word) {
                        person.masculine += 1;
                    } else if self.pronouns.feminine.contains(word) {
                        person.feminine += 1;
                    }
                }
            }

            let first_names: BTreeSet<&str> =
                record.aliases.iter().filter_map(|a| first_name(a)).collect();
            for name in first_names {
                let tally = tallies.entry(name.to_string()).or_default();
                tally.masculine += person.masculine;
                tally.feminine += person.feminine;
            }
        }

        tallies
    }

    /// Gender verdict per first name
    pub fn first_name_verdicts(&self, table: &PersonTable) -> BTreeMap<String, Gender> {
        self.first_name_tallies(table)
            .into_iter()
            .map(|(name, tally)| (name, tally.verdict()))
            .collect()
    }

    /// Assign every person a gender: the canonical name's first name is
    /// checked first, then each alias's in alias order.
    pub fn infer(&self, mut table: PersonTable) -> PersonTable {
        let verdicts = self.first_name_verdicts(&table);

        for record in table.iter_mut() {
            let candidates = std::iter::once(&record.canonical_name).chain(record.aliases.iter());
            record.gender = candidates
                .filter_map(|name| first_name(name))
                .filter_map(|name| verdicts.get(name).copied())
                .find(|gender| *gender != Gender::Unknown)
                .unwrap_or(Gender::Unknown);
        }

        let assigned = table.iter().filter(|r| r.gender != Gender::Unknown).count();
        log::debug!("gender resolved for {} of {} people", assigned, table.len());
        table
    }
}

// =============================================================================
// Tests
// =============================================================================
