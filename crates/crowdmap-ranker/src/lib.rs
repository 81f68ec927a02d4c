//! crowdmap-ranker: competitive crowding analysis over canonical assets.
//!
//! Scores how crowded a target's pipeline is, looks for gaps in the field and
//! assembles the per-target report.

pub mod weights;
pub mod scorer;
pub mod whitespace;
pub mod report;
pub mod pipeline;

pub use pipeline::{AnalysisOutcome, AnalysisPipeline, RunSummary};
pub use report::CrowdingReport;
pub use scorer::{compute_crowding, CrowdingBreakdown};
pub use weights::PhaseWeights;
pub use whitespace::{Dimension, WhiteSpaceAnalyzer, WhiteSpaceFlag};
