//! Pipeline: articles in, resolved people + ranked communities out
//!
//! Stages run in order, each timed:
//! 1. resolution - normalize, merge aliases per article, fold into the person table
//! 2. gender - pronoun majority vote per first name
//! 3. graph - co-mention pair weights + two-pass pruning
//! 4. communities - randomized Louvain trials + cohesion filtering
//! 5. summary - degree and centrality report on the pruned graph

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::network::community::{Community, CommunityDetector};
use crate::network::graph::CoMentionGraph;
use crate::network::summary::NetworkSummary;
use crate::resolution::aggregate::{PersonAggregator, PersonTable};
use crate::resolution::gender::GenderInferencer;
use crate::resolution::ingest::ArticleRecord;

// =============================================================================
// Types
// =============================================================================

/// Timing statistics for each stage
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StageTimings {
    pub total_us: u64,
    pub resolution_us: u64,
    pub gender_us: u64,
    pub graph_us: u64,
    pub community_us: u64,
    pub summary_us: u64,
}

/// Aggregate statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineStats {
    pub timings: StageTimings,
    pub articles: usize,
    pub people: usize,
    /// Unpruned co-mention graph size
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub pruned_nodes: usize,
    pub pruned_edges: usize,
    pub communities: usize,
}

/// Full batch result
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub people: PersonTable,
    pub communities: Vec<Community>,
    pub summary: NetworkSummary,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// People and communities as JSON, without run-dependent timings
    pub fn results_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Results<'a> {
            people: &'a PersonTable,
            communities: &'a [Community],
        }

        Ok(serde_json::to_string(&Results {
            people: &self.people,
            communities: &self.communities,
        })?)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    aggregator: PersonAggregator,
    inferencer: GenderInferencer,
    detector: CommunityDetector,
}

impl Default for Pipeline {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            aggregator: PersonAggregator::from_config(&config.resolution),
            inferencer: GenderInferencer::new(config.pronouns.clone()),
            detector: CommunityDetector::default(),
            config,
        }
    }
}

impl Pipeline {
    /// Validate `config` and build every stage
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let config = config.into_validated()?;
        Ok(Self {
            aggregator: PersonAggregator::from_config(&config.resolution),
            inferencer: GenderInferencer::new(config.pronouns.clone()),
            detector: CommunityDetector::new(config.community.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Person table with genders assigned, rows ordered by canonical name
    pub fn resolve_people(&self, articles: &[ArticleRecord]) -> Result<PersonTable> {
        let table = self.aggregator.aggregate(articles)?;
        Ok(self.inferencer.infer(table))
    }

    /// Pruned co-mention graph
    pub fn build_graph(&self, people: &PersonTable) -> CoMentionGraph {
        CoMentionGraph::build(people, self.config.network.prune_floor)
    }

    pub fn detect_communities(&self, graph: &CoMentionGraph) -> Vec<Community> {
        self.detector.detect(graph)
    }

    /// Every stage, with counts and timings
    pub fn run(&self, articles: &[ArticleRecord]) -> Result<PipelineOutput> {
        let overall_start = instant::Instant::now();
        let mut stats = PipelineStats {
            articles: articles.len(),
            ..PipelineStats::default()
        };

        // Stage 1: entity resolution
        let resolution_start = instant::Instant::now();
        let table = self.aggregator.aggregate(articles)?;
        stats.timings.resolution_us = resolution_start.elapsed().as_micros() as u64;
        stats.people = table.len();

        // Stage 2: gender
        let gender_start = instant::Instant::now();
        let people = self.inferencer.infer(table);
        stats.timings.gender_us = gender_start.elapsed().as_micros() as u64;

        // Stage 3: co-mention graph
        let graph_start = instant::Instant::now();
        let raw = CoMentionGraph::from_table(&people);
        let graph = raw.prune(self.config.network.prune_floor);
        stats.timings.graph_us = graph_start.elapsed().as_micros() as u64;
        stats.graph_nodes = raw.node_count();
        stats.graph_edges = raw.edge_count();
        stats.pruned_nodes = graph.node_count();
        stats.pruned_edges = graph.edge_count();

        // Stage 4: communities
        let community_start = instant::Instant::now();
        let communities = self.detector.detect(&graph);
        stats.timings.community_us = community_start.elapsed().as_micros() as u64;
        stats.communities = communities.len();

        // Stage 5: summary
        let summary_start = instant::Instant::now();
        let summary = NetworkSummary::from_graph(&graph);
        stats.timings.summary_us = summary_start.elapsed().as_micros() as u64;

        stats.timings.total_us = overall_start.elapsed().as_micros() as u64;
        log::info!(
            "pipeline: {} articles -> {} people, graph {}/{} nodes after pruning, {} communities in {}us",
            stats.articles,
            stats.people,
            stats.pruned_nodes,
            stats.graph_nodes,
            stats.communities,
            stats.timings.total_us
        );

        Ok(PipelineOutput {
            people,
            communities,
            summary,
            stats,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::resolution::ingest::parse_articles;
    use std::collections::BTreeSet;

    fn scenario() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord::new("Art1").with_persons(["Anna Hansen", "Anna"]),
            ArticleRecord::new("Art2").with_persons(["Anna Hansen", "Peter Jensen"]),
            ArticleRecord::new("Art3").with_persons(["Peter Jensen"]),
        ]
    }

    /// Two newsroom cliques of four, each pair co-mentioned in 12 articles,
    /// plus one article bridging them.
    fn cliques_corpus() -> Vec<ArticleRecord> {
        let groups = [
            ["Anna Hansen", "Bo Holm", "Carl Berg", "Dorte Lund"],
            ["Erik Dahl", "Frida Kjær", "Gorm Vang", "Hanne Bech"],
        ];
        let mut articles = Vec::new();
        for (g, group) in groups.iter().enumerate() {
            for i in 0..12 {
                articles.push(ArticleRecord::new(format!("G{}-{}", g, i)).with_persons(group.iter().copied()));
            }
        }
        articles.push(ArticleRecord::new("bridge").with_persons(["Dorte Lund", "Erik Dahl"]));
        articles
    }

    #[test]
    fn test_scenario_end_to_end() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let articles = scenario();

        let people = pipeline.resolve_people(&articles).unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(
            people.get("Anna Hansen").unwrap().article_ids,
            BTreeSet::from(["Art1".to_string(), "Art2".to_string()])
        );
        assert_eq!(
            people.get("Peter Jensen").unwrap().article_ids,
            BTreeSet::from(["Art2".to_string(), "Art3".to_string()])
        );

        let raw = CoMentionGraph::from_table(&people);
        assert_eq!(raw.weight("Anna Hansen", "Peter Jensen"), Some(1));

        let graph = pipeline.build_graph(&people);
        assert!(graph.is_empty());
        assert!(pipeline.detect_communities(&graph).is_empty());

        let output = pipeline.run(&articles).unwrap();
        assert_eq!(output.stats.people, 2);
        assert_eq!(output.stats.graph_edges, 1);
        assert_eq!(output.stats.pruned_edges, 0);
        assert!(output.communities.is_empty());
        assert_eq!(output.summary.nodes, 0);
    }

    #[test]
    fn test_cliques_end_to_end() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline.run(&cliques_corpus()).unwrap();

        assert_eq!(output.stats.people, 8);
        // Bridge edge has weight 1 and is pruned
        assert_eq!(output.stats.pruned_edges, 12);
        assert_eq!(output.communities.len(), 2);
        for community in &output.communities {
            assert_eq!(community.size, 4);
            assert_eq!(community.internal_edges, 6 * 12);
        }
        assert_eq!(output.summary.nodes, 8);
    }

    #[test]
    fn test_run_is_deterministic() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let articles = cliques_corpus();

        let first = pipeline.run(&articles).unwrap();
        let second = pipeline.run(&articles).unwrap();
        assert_eq!(first.results_json().unwrap(), second.results_json().unwrap());
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn test_default_matches_default_config() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.config(), &PipelineConfig::default());
        assert!(pipeline.config().validate().is_ok());
    }

    #[test]
    fn test_pronoun_case_is_normalized() {
        let mut config = PipelineConfig::default();
        config.pronouns = crate::config::PronounSets {
            masculine: BTreeSet::from(["Han".to_string()]),
            feminine: BTreeSet::from(["HUN".to_string()]),
        };
        let pipeline = Pipeline::new(config).unwrap();
        assert!(pipeline.config().pronouns.masculine.contains("han"));
        assert!(pipeline.config().pronouns.feminine.contains("hun"));

        let articles = vec![ArticleRecord::new("A")
            .with_persons(["Bo Holm"])
            .with_coref_cluster("0", ["Bo Holm", "han"])];
        let people = pipeline.resolve_people(&articles).unwrap();
        assert_eq!(
            people.get("Bo Holm").unwrap().gender,
            crate::resolution::gender::Gender::Male
        );
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = PipelineConfig::default();
        config.community.cohesion_ratio = -0.1;
        assert!(matches!(Pipeline::new(config), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_run_from_json_input() {
        let articles = parse_articles(
            r#"[
                { "article_id": 1, "persons": ["Anna Hansen"], "coref_clusters": { "0": ["Anna Hansen", "hun"] } },
                { "article_id": 2, "persons": ["Anna"] },
                { "no_id": true }
            ]"#,
        )
        .unwrap();

        let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&articles).unwrap();
        assert_eq!(output.stats.articles, 2);

        // No article holds both names, so they stay separate people
        let names: Vec<&str> = output.people.iter().map(|r| r.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["Anna", "Anna Hansen"]);
        assert_eq!(
            output.people.get("Anna").unwrap().gender,
            crate::resolution::gender::Gender::Female
        );
    }
}
