//! Per-target output artifacts.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crowdmap_common::target_slug;
use crowdmap_ranker::report::group_by_phase;
use crowdmap_ranker::AnalysisOutcome;

pub fn assets_path(dir: &Path, target: &str) -> PathBuf {
    dir.join(format!("{}_normalized_assets.json", target_slug(target)))
}

pub fn report_path(dir: &Path, target: &str) -> PathBuf {
    dir.join(format!("{}_competitive_analysis.json", target_slug(target)))
}

/// Write the phase-grouped asset list and the report; returns the paths written.
pub async fn write_artifacts(dir: &Path, outcome: &AnalysisOutcome) -> anyhow::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let target = &outcome.report.target;
    let assets = assets_path(dir, target);
    let report = report_path(dir, target);

    let grouped = serde_json::to_string_pretty(&group_by_phase(&outcome.assets))?;
    tokio::fs::write(&assets, grouped)
        .await
        .with_context(|| format!("writing {}", assets.display()))?;

    let body = serde_json::to_string_pretty(&outcome.report)?;
    tokio::fs::write(&report, body)
        .await
        .with_context(|| format!("writing {}", report.display()))?;

    tracing::debug!("Wrote {} and {}", assets.display(), report.display());
    Ok(vec![assets, report])
}
