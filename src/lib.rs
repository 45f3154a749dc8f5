//! MentionGraph: Person Entity Resolution + Co-Mention Communities
//!
//! A Rust/WASM batch pipeline over news articles that have already been
//! through NER and coreference.
//!
//! # Architecture
//!
//! ## Resolution Components
//! - `normalize.rs` - NameNormalizer: cleanup + validity rules for raw NER names
//! - `similarity.rs` - Weighted fuzzy ratio (token sort / token set / partial)
//! - `alias.rs` - AliasMerger: greedy longest-first alias grouping per article
//! - `ingest.rs` - ArticleRecord + tolerant JSON loading
//! - `aggregate.rs` - PersonAggregator: corpus-wide person table
//! - `gender.rs` - GenderInferencer: pronoun majority vote per first name
//!
//! ## Network Components
//! - `graph.rs` - CoMentionGraph: shared-article pair weights + pruning
//! - `louvain.rs` - Seeded Louvain partitioner + modularity
//! - `community.rs` - CommunityDetector: randomized trials + cohesion filter
//! - `summary.rs` - NetworkSummary: degree and centrality report
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { MentionGraphCortex } from 'mentiongraph';
//!
//! await init();
//!
//! const cortex = new MentionGraphCortex();
//! cortex.configure({ community: { top_k: 5 } });
//!
//! const result = cortex.run([
//!   { article_id: 'a1', persons: ['Anna Hansen', 'Anna'],
//!     coref_clusters: { '0': ['Anna Hansen', 'hun'] } },
//!   { article_id: 'a2', persons: ['Anna Hansen', 'Peter Jensen'] },
//! ]);
//!
//! console.log(result.people);       // canonical name, aliases, articles, gender
//! console.log(result.communities);  // ranked by density, then size
//! console.log(result.stats);        // timing per stage
//! ```
//!
//! # Usage (Rust)
//! ```no_run
//! use mentiongraph::{parse_articles, Pipeline, PipelineConfig};
//!
//! let articles = parse_articles(r#"[{"article_id": "a1", "persons": ["Anna Hansen"]}]"#)?;
//! let output = Pipeline::new(PipelineConfig::default())?.run(&articles)?;
//! println!("{}", output.results_json()?);
//! # Ok::<(), mentiongraph::PipelineError>(())
//! ```

pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod network;
pub mod pipeline;
pub mod resolution;

// Public exports
pub use api::MentionGraphCortex;
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use network::*;
pub use pipeline::{Pipeline, PipelineOutput, PipelineStats, StageTimings};
pub use resolution::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook and console logging for the browser
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    console::init(log::LevelFilter::Info);
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("mentiongraph v{}", env!("CARGO_PKG_VERSION"))
}
