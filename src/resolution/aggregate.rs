//! PersonAggregator - folds per-article alias groups into global person records
//!
//! Aggregation is split into a pure per-article step ([`PersonAggregator::resolve_article`])
//! and a reduce step ([`PersonTable::fold`]). Articles are independent until
//! the fold, so the per-article step runs on the rayon pool when the
//! `parallel` feature is on; the fold always runs in article order.

use std::collections::{BTreeMap, BTreeSet};

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize, Serializer};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::ResolutionConfig;
use crate::error::Result;
use crate::resolution::alias::AliasMerger;
use crate::resolution::gender::Gender;
use crate::resolution::ingest::ArticleRecord;
use crate::resolution::normalize::NameNormalizer;

pub type ArticleId = String;
pub type ClusterId = String;

// =============================================================================
// Person Records
// =============================================================================

/// Everything known about one resolved person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub canonical_name: String,
    pub aliases: BTreeSet<String>,
    pub article_ids: BTreeSet<ArticleId>,
    pub descriptions: BTreeMap<ArticleId, Vec<String>>,
    pub coref_clusters: BTreeMap<ArticleId, BTreeMap<ClusterId, Vec<String>>>,
    pub gender: Gender,
}

impl PersonRecord {
    pub fn new(canonical_name: impl Into<String>) -> Self {
        let canonical_name = canonical_name.into();
        Self {
            aliases: BTreeSet::from([canonical_name.clone()]),
            canonical_name,
            article_ids: BTreeSet::new(),
            descriptions: BTreeMap::new(),
            coref_clusters: BTreeMap::new(),
            gender: Gender::Unknown,
        }
    }

    /// Record with the given article references and nothing else
    pub fn with_articles<S: Into<String>>(
        canonical_name: impl Into<String>,
        article_ids: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut record = Self::new(canonical_name);
        record.article_ids = article_ids.into_iter().map(Into::into).collect();
        record
    }

    /// Every coreference mention attached to this person, across articles
    pub fn coref_mentions(&self) -> impl Iterator<Item = &str> {
        self.coref_clusters
            .values()
            .flat_map(|clusters| clusters.values())
            .flat_map(|mentions| mentions.iter().map(String::as_str))
    }
}

/// One alias group's evidence from a single article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPerson {
    pub canonical: String,
    pub aliases: Vec<String>,
    /// `None` when no alias had a description entry in this article
    pub descriptions: Option<Vec<String>>,
    pub coref_clusters: BTreeMap<ClusterId, Vec<String>>,
}

/// Partial result for one article, ready to be folded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePeople {
    pub article_id: ArticleId,
    pub people: Vec<ResolvedPerson>,
}

// =============================================================================
// Person Table
// =============================================================================

/// Global person table keyed (and ordered) by canonical name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonTable {
    people: BTreeMap<String, PersonRecord>,
}

impl PersonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one article's partial result. Additive only: sets are unioned,
    /// description lists concatenated, coref clusters inserted.
    pub fn fold(mut self, partial: ArticlePeople) -> Self {
        let article_id = partial.article_id;

        for person in partial.people {
            let record = self
                .people
                .entry(person.canonical.clone())
                .or_insert_with(|| PersonRecord::new(person.canonical));

            record.article_ids.insert(article_id.clone());
            record.aliases.extend(person.aliases);

            if let Some(descriptions) = person.descriptions {
                record
                    .descriptions
                    .entry(article_id.clone())
                    .or_default()
                    .extend(descriptions);
            }

            if !person.coref_clusters.is_empty() {
                record
                    .coref_clusters
                    .entry(article_id.clone())
                    .or_default()
                    .extend(person.coref_clusters);
            }
        }

        self
    }

    /// Insert or replace a record
    pub fn insert(&mut self, record: PersonRecord) {
        self.people.insert(record.canonical_name.clone(), record);
    }

    pub fn get(&self, canonical_name: &str) -> Option<&PersonRecord> {
        self.people.get(canonical_name)
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.people.contains_key(canonical_name)
    }

    /// Records in canonical-name order
    pub fn iter(&self) -> impl Iterator<Item = &PersonRecord> {
        self.people.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PersonRecord> {
        self.people.values_mut()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn records(&self) -> Vec<&PersonRecord> {
        self.people.values().collect()
    }

    /// Rows as a JSON array, sorted by canonical name
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromIterator<PersonRecord> for PersonTable {
    fn from_iter<I: IntoIterator<Item = PersonRecord>>(iter: I) -> Self {
        let mut table = PersonTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

impl Serialize for PersonTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.people.values())
    }
}

// =============================================================================
// Aggregator
// =============================================================================

#[derive(Debug, Clone)]
pub struct PersonAggregator {
    merger: AliasMerger,
    normalizer: Option<NameNormalizer>,
}

impl Default for PersonAggregator {
    fn default() -> Self {
        Self::from_config(&ResolutionConfig::default())
    }
}

impl PersonAggregator {
    pub fn new(merger: AliasMerger, normalizer: Option<NameNormalizer>) -> Self {
        Self { merger, normalizer }
    }

    pub fn from_config(config: &ResolutionConfig) -> Self {
        Self::new(
            AliasMerger::from_config(config),
            config.normalize_names.then(|| NameNormalizer::new(config)),
        )
    }

    /// Resolve the people of one article without touching any shared state
    pub fn resolve_article(&self, article: &ArticleRecord) -> Result<ArticlePeople> {
        let normalized;
        let article = match &self.normalizer {
            Some(normalizer) => {
                normalized = article.normalized(normalizer);
                &normalized
            }
            None => article,
        };

        let groups = self.merger.merge(&article.persons);
        let mut people: Vec<ResolvedPerson> = groups
            .into_iter()
            .map(|group| {
                let mut descriptions: Option<Vec<String>> = None;
                for alias in &group.members {
                    if let Some(values) = article.descriptions.get(alias) {
                        descriptions.get_or_insert_with(Vec::new).extend(values.iter().cloned());
                    }
                }
                ResolvedPerson {
                    canonical: group.canonical,
                    aliases: group.members,
                    descriptions,
                    coref_clusters: BTreeMap::new(),
                }
            })
            .collect();

        attach_coref_clusters(&mut people, &article.coref_clusters)?;

        Ok(ArticlePeople {
            article_id: article.article_id.clone(),
            people,
        })
    }

    /// Resolve every article and fold the results in input order
    pub fn aggregate(&self, articles: &[ArticleRecord]) -> Result<PersonTable> {
        #[cfg(feature = "parallel")]
        let partials: Vec<ArticlePeople> = articles
            .par_iter()
            .map(|article| self.resolve_article(article))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let partials: Vec<ArticlePeople> = articles
            .iter()
            .map(|article| self.resolve_article(article))
            .collect::<Result<Vec<_>>>()?;

        let table = partials.into_iter().fold(PersonTable::new(), PersonTable::fold);
        log::debug!(
            "aggregated {} articles into {} people",
            articles.len(),
            table.len()
        );
        Ok(table)
    }
}

/// Attach each coref cluster to every person with an alias occurring inside
/// any of its mentions (case-sensitive substring match).
fn attach_coref_clusters(
    people: &mut [ResolvedPerson],
    clusters: &BTreeMap<ClusterId, Vec<String>>,
) -> Result<()> {
    if people.is_empty() || clusters.is_empty() {
        return Ok(());
    }

    let mut patterns: Vec<&str> = Vec::new();
    let mut pattern_owner: Vec<usize> = Vec::new();
    for (owner, person) in people.iter().enumerate() {
        for alias in &person.aliases {
            patterns.push(alias.as_str());
            pattern_owner.push(owner);
        }
    }

    let matcher = AhoCorasick::new(&patterns)?;

    let mut hits: Vec<(usize, &ClusterId)> = Vec::new();
    for (cluster_id, mentions) in clusters {
        let owners: BTreeSet<usize> = mentions
            .iter()
            .flat_map(|mention| matcher.find_overlapping_iter(mention.as_str()))
            .map(|m| pattern_owner[m.pattern().as_usize()])
            .collect();
        hits.extend(owners.into_iter().map(|owner| (owner, cluster_id)));
    }

    for (owner, cluster_id) in hits {
        people[owner]
            .coref_clusters
            .insert(cluster_id.clone(), clusters[cluster_id].clone());
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
