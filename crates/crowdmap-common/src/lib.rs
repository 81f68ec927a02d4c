//! crowdmap-common: shared types, errors, and configuration used across all crowdmap crates.

pub mod error;
pub mod entities;
pub mod analysis_config;

// Re-export commonly used types
pub use analysis_config::{AnalysisConfig, ScoringConfig, WhiteSpaceConfig};
pub use entities::{target_slug, AssetMention, CanonicalAsset, Phase, Region, SourceTag, Term, TermStatus};
pub use error::{CrowdmapError, Result};
