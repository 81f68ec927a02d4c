//! Crowding score computation.
//!
//! ```text
//! raw_score    = Σ weight(asset.phase)
//! max_possible = asset_count × weight(Approved)
//! crowding     = clamp(raw_score / max_possible, 0, 1)   (0.0 when there are no assets)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crowdmap_common::{CanonicalAsset, Phase};

use crate::weights::PhaseWeights;

/// Auditable score breakdown for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrowdingBreakdown {
    pub raw_score: f64,
    pub max_possible: f64,
    /// In [0, 1], unrounded.
    pub crowding_score: f64,
    pub total: usize,
    /// Every phase present, zero-filled.
    pub phase_distribution: BTreeMap<Phase, usize>,
}

/// Asset count per phase, with every phase present.
pub fn phase_distribution(assets: &[CanonicalAsset]) -> BTreeMap<Phase, usize> {
    let mut dist: BTreeMap<Phase, usize> = Phase::ALL.iter().map(|p| (*p, 0)).collect();
    for asset in assets {
        *dist.entry(asset.phase).or_insert(0) += 1;
    }
    dist
}

pub fn compute_crowding(assets: &[CanonicalAsset], weights: &PhaseWeights) -> CrowdingBreakdown {
    let raw_score: f64 = assets.iter().map(|a| weights.weight(a.phase)).sum();
    let max_possible = assets.len() as f64 * weights.max_weight();

    let crowding_score = if assets.is_empty() || max_possible <= 0.0 {
        0.0
    } else {
        (raw_score / max_possible).clamp(0.0, 1.0)
    };

    CrowdingBreakdown {
        raw_score,
        max_possible,
        crowding_score,
        total: assets.len(),
        phase_distribution: phase_distribution(assets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crowdmap_common::{SourceTag, Term};

    fn asset(name: &str, phase: Phase) -> CanonicalAsset {
        CanonicalAsset {
            name: name.to_string(),
            aliases: BTreeSet::new(),
            sponsor: String::new(),
            modality: Term::unknown(),
            mechanism: Term::unknown(),
            indication: String::new(),
            phase,
            status: None,
            acquisition: false,
            acquisition_notes: vec![],
            sources: BTreeSet::from([SourceTag::ClinicalTrials]),
            source_records: BTreeSet::new(),
            reported_at: None,
        }
    }

    #[test]
    fn test_empty_set_scores_zero() {
        let b = compute_crowding(&[], &PhaseWeights::default());
        assert_eq!(b.crowding_score, 0.0);
        assert_eq!(b.total, 0);
        assert_eq!(b.phase_distribution.len(), 5);
        assert!(b.phase_distribution.values().all(|n| *n == 0));
    }

    #[test]
    fn test_preclinical_and_approved() {
        let assets = vec![asset("X", Phase::Preclinical), asset("Y", Phase::Approved)];
        let b = compute_crowding(&assets, &PhaseWeights::default());
        assert!((b.raw_score - 1.2).abs() < 1e-9);
        assert_eq!(b.max_possible, 2.0);
        assert!((b.crowding_score - 0.6).abs() < 1e-9);
        assert_eq!(b.phase_distribution[&Phase::Approved], 1);
        assert_eq!(b.phase_distribution[&Phase::PhaseII], 0);
    }

    #[test]
    fn test_all_approved_saturates() {
        let assets = vec![asset("A", Phase::Approved), asset("B", Phase::Approved)];
        assert_eq!(compute_crowding(&assets, &PhaseWeights::default()).crowding_score, 1.0);
    }

    #[test]
    fn test_advancing_a_phase_never_lowers_score() {
        let w = PhaseWeights::default();
        let mut assets = vec![
            asset("A", Phase::Preclinical),
            asset("B", Phase::PhaseI),
            asset("C", Phase::PhaseIII),
        ];
        let mut last = compute_crowding(&assets, &w).crowding_score;
        for phase in &Phase::ALL[1..] {
            assets[0].phase = *phase;
            let next = compute_crowding(&assets, &w).crowding_score;
            assert!(next >= last, "{phase}: {next} < {last}");
            assert!((0.0..=1.0).contains(&next));
            last = next;
        }
    }

    #[test]
    fn test_distribution_serializes_with_phase_labels() {
        let b = compute_crowding(&[asset("A", Phase::PhaseI)], &PhaseWeights::default());
        let json = serde_json::to_value(&b.phase_distribution).unwrap();
        assert_eq!(json["Phase I"], 1);
        assert_eq!(json["Approved"], 0);
    }
}
