//! Co-mention network analysis
//!
//! [`graph`] turns a person table into a pruned weighted graph,
//! [`community`] partitions it with repeated [`louvain`] trials and
//! [`summary`] reports its structure.

pub mod graph;
pub mod louvain;
pub mod community;
pub mod summary;

pub use community::{Community, CommunityDetector, TrialOutcome};
pub use graph::{CoMentionEdge, CoMentionGraph};
pub use louvain::{Louvain, Partitioner};
pub use summary::NetworkSummary;

#[cfg(test)]
mod tests;
