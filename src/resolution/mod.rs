//! Person entity resolution
//!
//! Raw per-article name mentions go through [`normalize`], are grouped into
//! aliases per article by [`alias`], folded into a global person table by
//! [`aggregate`] and finally tagged with a pronoun-based gender by [`gender`].

pub mod normalize;
pub mod similarity;
pub mod alias;
pub mod ingest;
pub mod aggregate;
pub mod gender;

pub use aggregate::{PersonAggregator, PersonRecord, PersonTable};
pub use alias::{AliasGroup, AliasMerger};
pub use gender::{Gender, GenderInferencer};
pub use ingest::{parse_articles, ArticleRecord};
pub use normalize::NameNormalizer;
