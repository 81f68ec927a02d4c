//! Batch execution: one analysis per target, run concurrently.
//!
//! Each target is fetched, analysed and written independently. A target whose
//! mentions cannot be loaded still gets an (empty) report and is counted as a
//! failure; it never stops the rest of the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crowdmap_common::SourceTag;
use crowdmap_ingestion::sources::MentionSource;
use crowdmap_ingestion::targets::read_targets;
use crowdmap_ranker::{AnalysisOutcome, AnalysisPipeline};

use crate::output::write_artifacts;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub dry_run: bool,
    pub default_source: SourceTag,
}

#[derive(Debug)]
pub struct TargetResult {
    pub target: String,
    pub outcome: AnalysisOutcome,
    pub artifacts: Vec<PathBuf>,
    /// Load or write failure, if any.
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<TargetResult>,
    /// Tasks that died without producing a result.
    pub aborted: usize,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count() + self.aborted
    }
}

/// Expand CLI arguments into target names: existing files are read as target
/// lists, anything else is a target name. Case-insensitive duplicates are dropped.
pub fn expand_targets(args: &[String]) -> anyhow::Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        let names = if path.is_file() {
            read_targets(path)?
        } else {
            vec![arg.trim().to_string()]
        };
        for name in names {
            if !name.is_empty() && seen.insert(name.to_lowercase()) {
                targets.push(name);
            }
        }
    }
    Ok(targets)
}

pub async fn run_batch(
    targets: Vec<String>,
    source: Arc<dyn MentionSource>,
    pipeline: Arc<AnalysisPipeline>,
    options: &BatchOptions,
) -> BatchReport {
    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let options = Arc::new(options.clone());
    let mut tasks = JoinSet::new();

    info!(
        "Analysing {} targets with {} workers (source: {})",
        targets.len(),
        options.workers.max(1),
        source.name()
    );

    for (index, target) in targets.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let source = source.clone();
        let pipeline = pipeline.clone();
        let options = options.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = run_target(target, source.as_ref(), &pipeline, &options).await;
            (index, result)
        });
    }

    let mut indexed = Vec::new();
    let mut aborted = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => indexed.push(pair),
            Err(e) => {
                error!("Target task failed: {e}");
                aborted += 1;
            }
        }
    }
    indexed.sort_by_key(|(i, _)| *i);

    let report = BatchReport {
        results: indexed.into_iter().map(|(_, r)| r).collect(),
        aborted,
    };
    info!(
        "Batch complete: {} targets, {} failed",
        report.results.len() + report.aborted,
        report.failed()
    );
    report
}

async fn run_target(
    target: String,
    source: &dyn MentionSource,
    pipeline: &AnalysisPipeline,
    options: &BatchOptions,
) -> TargetResult {
    let mut error = None;
    let records = match source.fetch(&target).await {
        Ok(records) => records,
        Err(e) => {
            error!("Could not load mentions for {}: {:#}", target, e);
            error = Some(format!("{e:#}"));
            Vec::new()
        }
    };

    let outcome = pipeline.run(&target, &records, &options.default_source);
    info!(
        run_id = %outcome.summary.run_id,
        "{}: {} records, {} accepted, {} assets",
        target,
        outcome.summary.records_in,
        outcome.summary.accepted,
        outcome.assets.len()
    );

    let mut artifacts = Vec::new();
    if options.dry_run {
        info!("Dry run: not writing artifacts for {}", target);
    } else {
        match write_artifacts(&options.output_dir, &outcome).await {
            Ok(paths) => artifacts = paths,
            Err(e) => {
                warn!("Could not write artifacts for {}: {:#}", target, e);
                if error.is_none() {
                    error = Some(format!("{e:#}"));
                }
            }
        }
    }

    TargetResult { target, outcome, artifacts, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crowdmap_common::AnalysisConfig;
    use crowdmap_ingestion::sources::MockMentionSource;
    use crowdmap_ingestion::Lexicon;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    struct FailingSource;

    #[async_trait]
    impl MentionSource for FailingSource {
        async fn fetch(&self, target: &str) -> anyhow::Result<Vec<Value>> {
            if target == "BROKEN" {
                anyhow::bail!("registry unavailable");
            }
            Ok(vec![json!({"drug_name": "AK117", "phase": "Phase I"})])
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn pipeline() -> Arc<AnalysisPipeline> {
        Arc::new(AnalysisPipeline::new(
            Arc::new(Lexicon::builtin().unwrap()),
            Arc::new(AnalysisConfig::default()),
        ))
    }

    fn options(dir: &Path, dry_run: bool) -> BatchOptions {
        BatchOptions {
            output_dir: dir.to_path_buf(),
            workers: 2,
            dry_run,
            default_source: SourceTag::ClinicalTrials,
        }
    }

    #[tokio::test]
    async fn test_batch_writes_artifacts_in_target_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockMentionSource::new()
            .with("CD47", vec![json!({"drug_name": "ALX148", "indication": "AML", "phase": "Phase II"})])
            .with("KRAS G12D", vec![json!({"drug_name": "MRTX1133", "phase": "Phase I"})]);
        let report = run_batch(
            vec!["CD47".into(), "KRAS G12D".into(), "TIGIT".into()],
            Arc::new(source),
            pipeline(),
            &options(dir.path(), false),
        )
        .await;

        let targets: Vec<_> = report.results.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["CD47", "KRAS G12D", "TIGIT"]);
        assert_eq!(report.failed(), 0);
        assert!(dir.path().join("CD47_competitive_analysis.json").exists());
        assert!(dir.path().join("KRAS_G12D_normalized_assets.json").exists());

        let written: Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("CD47_normalized_assets.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written["Phase II"][0]["name"], "Evorpacept (ALX148)");

        let tigit: Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("TIGIT_competitive_analysis.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(tigit["crowding_score"], 0.0);
    }

    #[tokio::test]
    async fn test_failing_target_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_batch(
            vec!["BROKEN".into(), "CD47".into()],
            Arc::new(FailingSource),
            pipeline(),
            &options(dir.path(), false),
        )
        .await;
        assert_eq!(report.failed(), 1);
        let broken = &report.results[0];
        assert!(broken.error.as_deref().unwrap().contains("registry unavailable"));
        assert_eq!(broken.outcome.report.total_competitors, 0);
        assert_eq!(report.results[1].outcome.report.total_competitors, 1);
        assert_eq!(report.results[1].artifacts.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let report = run_batch(
            vec!["CD47".into()],
            Arc::new(FailingSource),
            pipeline(),
            &options(&out, true),
        )
        .await;
        assert_eq!(report.results[0].outcome.assets.len(), 1);
        assert!(report.results[0].artifacts.is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_expand_targets_reads_lists_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("targets.txt");
        std::fs::write(&list, "KRAS\ncd47\nTIGIT\n").unwrap();
        let args = vec!["CD47".to_string(), list.to_string_lossy().into_owned(), " ".to_string()];
        assert_eq!(expand_targets(&args).unwrap(), vec!["CD47", "KRAS", "TIGIT"]);
    }
}
