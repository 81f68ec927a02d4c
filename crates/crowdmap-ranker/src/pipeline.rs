//! Per-target analysis pipeline.
//!
//! Runs the deterministic core for a single target:
//!   1. Validate and coerce raw records
//!   2. Resolve aliases and deduplicate into canonical assets
//!   3. Score crowding
//!   4. Look for white space
//!   5. Assemble the report
//!
//! The pipeline holds only shared immutable state, so one instance can serve
//! any number of concurrent runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crowdmap_common::{AnalysisConfig, CanonicalAsset, SourceTag};
use crowdmap_ingestion::{ingest_records, DedupStats, Lexicon, RejectReason, Resolver};

use crate::report::CrowdingReport;
use crate::scorer::{compute_crowding, CrowdingBreakdown};
use crate::weights::PhaseWeights;
use crate::whitespace::WhiteSpaceAnalyzer;

// ── Result summary ────────────────────────────────────────────────────────────

/// Counters for one run, suitable for logging or a run manifest.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub records_in: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
    pub dedup: DedupStats,
    pub white_space_flags: usize,
}

/// Everything a run hands off: the report and the normalised asset list.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: CrowdingReport,
    pub assets: Vec<CanonicalAsset>,
    pub breakdown: CrowdingBreakdown,
    pub summary: RunSummary,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    lexicon: Arc<Lexicon>,
    config: Arc<AnalysisConfig>,
    weights: PhaseWeights,
}

impl AnalysisPipeline {
    pub fn new(lexicon: Arc<Lexicon>, config: Arc<AnalysisConfig>) -> Self {
        let weights = PhaseWeights::from_config(&config.scoring);
        Self { lexicon, config, weights }
    }

    #[instrument(skip(self, records, default_source), fields(records = records.len()))]
    pub fn run(&self, target: &str, records: &[Value], default_source: &SourceTag) -> AnalysisOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let ingest = ingest_records(records, default_source);
        let (assets, dedup) = Resolver::new(&self.lexicon).resolve(&ingest.accepted);
        let breakdown = compute_crowding(&assets, &self.weights);
        let flags = WhiteSpaceAnalyzer::new(&self.lexicon, &self.config.whitespace).analyze(target, &assets);
        let report = CrowdingReport::assemble(target, &assets, &breakdown, flags, &self.weights);

        info!(
            "{}: {} competitors, crowding {:.3}, {} white-space flags",
            target,
            report.total_competitors,
            report.crowding_score,
            report.white_space_flags.len()
        );

        let summary = RunSummary {
            run_id,
            target: target.to_string(),
            started_at,
            records_in: records.len(),
            accepted: ingest.accepted.len(),
            rejected: ingest.rejected,
            dedup,
            white_space_flags: report.white_space_flags.len(),
        };

        AnalysisOutcome { report, assets, breakdown, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pipeline() -> AnalysisPipeline {
        AnalysisPipeline::new(Arc::new(Lexicon::builtin().unwrap()), Arc::new(AnalysisConfig::default()))
    }

    #[test]
    fn test_run_counts_rejections_and_merges() {
        let records = vec![
            json!({"drug_name": "ALX148", "indication": "AML", "phase": "Phase II"}),
            json!({"drug_name": "Evorpacept (ALX148)", "indication": "AML", "phase": "Phase 2", "source": "euctr"}),
            json!({"drug_name": "unknown"}),
            json!("garbage"),
        ];
        let outcome = pipeline().run("CD47", &records, &SourceTag::ClinicalTrials);
        assert_eq!(outcome.summary.records_in, 4);
        assert_eq!(outcome.summary.accepted, 2);
        assert_eq!(outcome.summary.rejected.values().sum::<usize>(), 2);
        assert_eq!(outcome.assets.len(), 1);
        assert_eq!(outcome.report.total_competitors, 1);
        assert_eq!(outcome.report.crowding_score, 0.6);
    }

    #[test]
    fn test_run_on_no_records() {
        let outcome = pipeline().run("TIGIT", &[], &SourceTag::PubMed);
        assert_eq!(outcome.report.crowding_score, 0.0);
        assert!(outcome.report.white_space_flags.is_empty());
        assert!(outcome.report.phase_distribution.values().all(|n| *n == 0));
        assert_eq!(outcome.report.phase_distribution.len(), 5);
    }
}
