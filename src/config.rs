//! Configuration types and defaults for the mention graph pipeline
//!
//! Every knob the batch run exposes lives here. All types deserialize from
//! partial JSON (missing fields take their defaults) and are checked by
//! [`PipelineConfig::validate`] before any article is touched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{PipelineError, Result};

// =============================================================================
// Resolution
// =============================================================================

/// Fuzzy scorer used by the alias merger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityScorer {
    /// Weighted mix of plain, partial and token-based ratios
    #[default]
    WeightedRatio,
    /// Jaro-Winkler similarity scaled to 0-100
    JaroWinkler,
}

/// Parameters for name cleaning and per-article alias merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Minimum similarity (0-100) for two names to share an alias group. Default: 85
    pub similarity_threshold: u8,
    /// Scorer used for alias similarity. Default: WeightedRatio
    pub scorer: SimilarityScorer,
    /// Run the name normalizer over person lists and description keys. Default: true
    pub normalize_names: bool,
    /// Substrings (case-insensitive) marking prices/product info rather than names. Default: ["kr."]
    pub currency_markers: Vec<String>,
    /// Names with more whitespace-delimited words are rejected. Default: 6
    pub max_name_words: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 85,
            scorer: SimilarityScorer::WeightedRatio,
            normalize_names: true,
            currency_markers: vec!["kr.".to_string()],
            max_name_words: 6,
        }
    }
}

// =============================================================================
// Pronouns
// =============================================================================

/// Masculine and feminine pronoun tokens for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PronounSets {
    pub masculine: BTreeSet<String>,
    pub feminine: BTreeSet<String>,
}

impl Default for PronounSets {
    fn default() -> Self {
        Self::danish()
    }
}

impl PronounSets {
    pub fn new<M, F>(masculine: M, feminine: F) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Self {
            masculine: masculine.into_iter().map(|p| p.as_ref().to_lowercase()).collect(),
            feminine: feminine.into_iter().map(|p| p.as_ref().to_lowercase()).collect(),
        }
    }

    /// Danish third-person pronouns
    pub fn danish() -> Self {
        Self::new(["han", "ham", "hans"], ["hun", "hende", "hendes"])
    }

    /// English third-person pronouns
    pub fn english() -> Self {
        Self::new(
            ["he", "him", "his", "himself"],
            ["she", "her", "hers", "herself"],
        )
    }

    /// Tokens are matched lower-cased; normalize after deserializing.
    fn lowercased(&self) -> Self {
        Self::new(&self.masculine, &self.feminine)
    }

    pub fn validate(&self) -> Result<()> {
        if self.masculine.is_empty() || self.feminine.is_empty() {
            return Err(PipelineError::invalid_config(
                "pronoun sets must both be non-empty",
            ));
        }
        if let Some(shared) = self.masculine.intersection(&self.feminine).next() {
            return Err(PipelineError::invalid_config(format!(
                "pronoun '{}' is both masculine and feminine",
                shared
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Network + Communities
// =============================================================================

/// Co-mention graph construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Edges with weight <= floor are dropped before leaf pruning. Default: 2
    pub prune_floor: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { prune_floor: 2 }
    }
}

/// Randomized community detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Number of independent partitioning trials. Default: 10
    pub runs: usize,
    /// Maximum communities emitted. Default: 10
    pub top_k: usize,
    /// Minimum edge weight kept in each trial subgraph. Default: 10
    pub weight_threshold: u32,
    /// Minimum share of a member's weighted degree inside its community. Default: 0.5
    pub cohesion_ratio: f64,
    /// Louvain resolution; higher gives more, smaller communities. Default: 1.5
    pub resolution: f64,
    /// Seed for the single generator driving all trials. Default: 42
    pub seed: u64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            runs: 10,
            top_k: 10,
            weight_threshold: 10,
            cohesion_ratio: 0.5,
            resolution: 1.5,
            seed: 42,
        }
    }
}

impl CommunityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(PipelineError::invalid_config("runs must be at least 1"));
        }
        if self.top_k == 0 {
            return Err(PipelineError::invalid_config("top_k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.cohesion_ratio) {
            return Err(PipelineError::invalid_config(format!(
                "cohesion_ratio must be within [0, 1], got {}",
                self.cohesion_ratio
            )));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(PipelineError::invalid_config(format!(
                "resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub resolution: ResolutionConfig,
    pub pronouns: PronounSets,
    pub network: NetworkConfig,
    pub community: CommunityConfig,
}

impl PipelineConfig {
    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Like [`from_json`](Self::from_json) for an already parsed document.
    /// Integer fields outside their type's range are configuration errors,
    /// not JSON errors.
    pub fn from_value(value: Value) -> Result<Self> {
        check_integer_ranges(&value)?;
        let config: PipelineConfig = serde_json::from_value(value)?;
        config.into_validated()
    }

    /// Lower-case pronoun tokens and validate a freshly deserialized config
    pub fn into_validated(mut self) -> Result<Self> {
        self.pronouns = self.pronouns.lowercased();
        self.validate()?;
        Ok(self)
    }

    /// English pronoun preset, everything else default
    pub fn english() -> Self {
        Self {
            pronouns: PronounSets::english(),
            ..Self::default()
        }
    }

    /// Reject configurations that indicate a caller bug
    pub fn validate(&self) -> Result<()> {
        if self.resolution.similarity_threshold > 100 {
            return Err(PipelineError::invalid_config(format!(
                "similarity_threshold must be within [0, 100], got {}",
                self.resolution.similarity_threshold
            )));
        }
        if self.resolution.max_name_words == 0 {
            return Err(PipelineError::invalid_config("max_name_words must be at least 1"));
        }
        self.pronouns.validate()?;
        self.community.validate()
    }
}

/// (section, field, largest accepted value) for every unsigned integer knob
const INTEGER_FIELDS: &[(&str, &str, u64)] = &[
    ("resolution", "similarity_threshold", u8::MAX as u64),
    ("resolution", "max_name_words", u32::MAX as u64),
    ("network", "prune_floor", u32::MAX as u64),
    ("community", "runs", u32::MAX as u64),
    ("community", "top_k", u32::MAX as u64),
    ("community", "weight_threshold", u32::MAX as u64),
    ("community", "seed", u64::MAX),
];

fn check_integer_ranges(value: &Value) -> Result<()> {
    for &(section, field, max) in INTEGER_FIELDS {
        let Some(Value::Number(number)) = value.get(section).and_then(|s| s.get(field)) else {
            continue;
        };
        match number.as_u64() {
            Some(n) if n <= max => {}
            Some(n) => {
                return Err(PipelineError::invalid_config(format!(
                    "{}.{} must be at most {}, got {}",
                    section, field, max, n
                )))
            }
            None => {
                return Err(PipelineError::invalid_config(format!(
                    "{}.{} must be a non-negative integer, got {}",
                    section, field, number
                )))
            }
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
