//! crowdmap-ingestion: everything between the extraction boundary and a
//! canonical asset set:
//! - Record validation and coercion
//! - Alias, phase, modality and mechanism normalisation
//! - Deduplication into canonical assets
//! - Mention sources and target-list reading

pub mod ingest;
pub mod normalise;
pub mod dedup;
pub mod sources;
pub mod targets;

pub use dedup::{DedupStats, MergeOutcome, Resolver};
pub use ingest::{ingest_records, IngestReport, RejectReason};
pub use normalise::Lexicon;
