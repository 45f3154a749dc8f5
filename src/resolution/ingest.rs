//! Article ingest - upstream NER/coref output to typed article records
//!
//! Each article arrives as a JSON object:
//!
//! ```json
//! {
//!   "article_id": "Art1",
//!   "persons": ["Anna Hansen", "Anna"],
//!   "person_descriptions": { "Anna": ["minister", "mor"], "Anna Hansen": "borgmester" },
//!   "coref_clusters": { "0": ["Anna Hansen", "hun", "hende"] }
//! }
//! ```
//!
//! `article_id` may be a string or a number. A description value may be a
//! single string or a list. Records that cannot be read are skipped with a
//! warning; only a non-array top level fails the batch.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::resolution::normalize::NameNormalizer;

// =============================================================================
// Types
// =============================================================================

/// One annotated article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(deserialize_with = "id_string")]
    pub article_id: String,
    /// Raw person mentions in article order
    #[serde(default, alias = "names")]
    pub persons: Vec<String>,
    /// Raw name -> descriptive modifiers
    #[serde(default, alias = "person_descriptions", deserialize_with = "one_or_many_map")]
    pub descriptions: BTreeMap<String, Vec<String>>,
    /// Cluster id -> mention strings
    #[serde(default)]
    pub coref_clusters: BTreeMap<String, Vec<String>>,
}

impl ArticleRecord {
    pub fn new(article_id: impl Into<String>) -> Self {
        Self {
            article_id: article_id.into(),
            ..Self::default()
        }
    }

    pub fn with_persons<S: Into<String>>(mut self, persons: impl IntoIterator<Item = S>) -> Self {
        self.persons = persons.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, name: &str, description: &str) -> Self {
        self.descriptions
            .entry(name.to_string())
            .or_default()
            .push(description.to_string());
        self
    }

    pub fn with_coref_cluster<S: Into<String>>(
        mut self,
        cluster_id: &str,
        mentions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.coref_clusters.insert(
            cluster_id.to_string(),
            mentions.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Copy of this record with person names and description keys cleaned.
    ///
    /// Description keys that collapse onto the same name are concatenated in
    /// key order; keys that fail normalization are dropped with their values.
    pub fn normalized(&self, normalizer: &NameNormalizer) -> Self {
        let persons = normalizer.normalize_all(&self.persons);

        let mut descriptions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (raw, values) in &self.descriptions {
            let Some(name) = normalizer.normalize(raw) else {
                continue;
            };
            let slot = descriptions.entry(name).or_default();
            if !slot.is_empty() {
                log::warn!(
                    "article {}: description key '{}' collapses onto an existing name",
                    self.article_id,
                    raw
                );
            }
            slot.extend(values.iter().cloned());
        }

        Self {
            article_id: self.article_id.clone(),
            persons,
            descriptions,
            coref_clusters: self.coref_clusters.clone(),
        }
    }
}

// =============================================================================
// Field Decoders
// =============================================================================

fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "article_id must be a string or number, got {}",
            other
        ))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many_map<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, OneOrMany> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| match value {
            OneOrMany::One(s) => (name, vec![s]),
            OneOrMany::Many(v) => (name, v),
        })
        .collect())
}

// =============================================================================
// Batch Parsing
// =============================================================================

/// Parse a JSON array of article objects, skipping unreadable elements
pub fn parse_articles(json: &str) -> Result<Vec<ArticleRecord>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => Ok(records_from_values(items)),
        other => Err(PipelineError::parse(format!(
            "expected a JSON array of articles, got {}",
            value_kind(&other)
        ))),
    }
}

/// Decode already-parsed values, skipping unreadable elements
pub fn records_from_values(items: Vec<Value>) -> Vec<ArticleRecord> {
    let total = items.len();
    let records: Vec<ArticleRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<ArticleRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("skipping article record {}: {}", index, e);
                None
            }
        })
        .collect();

    log::debug!("ingested {} of {} article records", records.len(), total);
    records
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let json = r#"[{
            "article_id": "Art1",
            "persons": ["Anna Hansen", "Anna"],
            "person_descriptions": { "Anna": ["minister"], "Anna Hansen": "borgmester" },
            "coref_clusters": { "0": ["Anna Hansen", "hun"] }
        }]"#;

        let records = parse_articles(json).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.article_id, "Art1");
        assert_eq!(record.persons, vec!["Anna Hansen", "Anna"]);
        assert_eq!(record.descriptions["Anna"], vec!["minister"]);
        assert_eq!(record.descriptions["Anna Hansen"], vec!["borgmester"]);
        assert_eq!(record.coref_clusters["0"], vec!["Anna Hansen", "hun"]);
    }

    #[test]
    fn test_numeric_id_and_missing_optional_fields() {
        let records = parse_articles(r#"[{ "article_id": 17 }]"#).unwrap();
        assert_eq!(records[0].article_id, "17");
        assert!(records[0].persons.is_empty());
        assert!(records[0].descriptions.is_empty());
    }

    #[test]
    fn test_bad_elements_skipped() {
        let json = r#"[
            { "persons": ["No Id"] },
            { "article_id": "A", "persons": "not a list" },
            42,
            { "article_id": "B", "names": ["Peter Jensen"] }
        ]"#;

        let records = parse_articles(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].article_id, "B");
        assert_eq!(records[0].persons, vec!["Peter Jensen"]);
    }

    #[test]
    fn test_top_level_must_be_array() {
        let err = parse_articles(r#"{ "article_id": "A" }"#).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
        assert!(err.to_string().contains("an object"));

        assert!(matches!(parse_articles("[oops"), Err(PipelineError::Json(_))));
    }

    #[test]
    fn test_normalized_collapses_description_keys() {
        let record = ArticleRecord::new("A")
            .with_persons(["  Anna hansen ", "1299 kr."])
            .with_description("Anna hansen", "minister")
            .with_description("Anna Hansen!", "mor")
            .with_description("999", "ignored");

        let normalized = record.normalized(&NameNormalizer::default());
        assert_eq!(normalized.persons, vec!["Anna Hansen"]);
        assert_eq!(normalized.descriptions.len(), 1);

        // "Anna Hansen!" sorts before "Anna hansen"
        assert_eq!(normalized.descriptions["Anna Hansen"], vec!["mor", "minister"]);
    }

    #[test]
    fn test_builder_helpers() {
        let record = ArticleRecord::new("X")
            .with_persons(["Bo"])
            .with_coref_cluster("c1", ["Bo", "han"]);
        assert_eq!(record.persons, vec!["Bo"]);
        assert_eq!(record.coref_clusters["c1"], vec!["Bo", "han"]);
    }
}
