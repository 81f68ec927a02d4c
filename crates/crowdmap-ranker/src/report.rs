//! Per-target report assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crowdmap_common::{CanonicalAsset, Phase};

use crate::scorer::CrowdingBreakdown;
use crate::weights::PhaseWeights;
use crate::whitespace::{count_labels, WhiteSpaceFlag};

/// Final competitive-landscape report for one target. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrowdingReport {
    pub target: String,
    /// In [0, 1], rounded to 3 decimals.
    pub crowding_score: f64,
    pub total_competitors: usize,
    pub phase_distribution: BTreeMap<Phase, usize>,
    pub modalities: BTreeMap<String, usize>,
    pub notable_acquisitions: Vec<String>,
    pub white_space_flags: Vec<WhiteSpaceFlag>,
    pub methodology: String,
}

impl CrowdingReport {
    pub fn assemble(
        target: &str,
        assets: &[CanonicalAsset],
        breakdown: &CrowdingBreakdown,
        flags: Vec<WhiteSpaceFlag>,
        weights: &PhaseWeights,
    ) -> Self {
        // Case-folded, labelled by first-seen spelling.
        let labels = assets.iter().map(|a| a.modality.label.as_str());
        let modalities: BTreeMap<String, usize> = count_labels(labels)
            .into_iter()
            .map(|(label, n)| (label.to_string(), n))
            .collect();

        let mut notable_acquisitions: Vec<String> = Vec::new();
        for note in assets.iter().flat_map(|a| a.acquisition_notes.iter()) {
            if !notable_acquisitions.iter().any(|n| n.eq_ignore_ascii_case(note)) {
                notable_acquisitions.push(note.clone());
            }
        }

        Self {
            target: target.to_string(),
            crowding_score: round3(breakdown.crowding_score),
            total_competitors: breakdown.total,
            phase_distribution: breakdown.phase_distribution.clone(),
            modalities,
            notable_acquisitions,
            white_space_flags: flags,
            methodology: methodology(weights),
        }
    }
}

fn methodology(weights: &PhaseWeights) -> String {
    format!(
        "Crowding score = sum of phase weights over canonical assets divided by \
         (asset count x Approved weight), clamped to [0, 1]. Phase weights: {}. \
         Assets are deduplicated by alias-resolved name and indication before scoring.",
        weights.describe()
    )
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Assets keyed by phase label, phases in order, empty phases omitted.
pub fn group_by_phase(assets: &[CanonicalAsset]) -> BTreeMap<Phase, Vec<CanonicalAsset>> {
    let mut groups: BTreeMap<Phase, Vec<CanonicalAsset>> = BTreeMap::new();
    for asset in assets {
        groups.entry(asset.phase).or_default().push(asset.clone());
    }
    groups
}
