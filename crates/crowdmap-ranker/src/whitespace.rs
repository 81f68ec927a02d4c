//! White-space (gap) analysis.
//!
//! Advisory only: looks for thin spots in a target's competitive field along
//! five dimensions and reports them as flags. Never fails; an empty asset set
//! yields no flags.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crowdmap_common::{CanonicalAsset, Phase, Region, TermStatus, WhiteSpaceConfig};
use crowdmap_ingestion::normalise::name_key;
use crowdmap_ingestion::Lexicon;

/// Modality term excluded from absence checks; it is a catch-all.
const CATCH_ALL_MODALITY: &str = "Other";

/// Flags are emitted in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Modality,
    Indication,
    Mechanism,
    Phase,
    Geography,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiteSpaceFlag {
    pub dimension: Dimension,
    pub description: String,
    pub evidence_count: usize,
}

impl WhiteSpaceFlag {
    fn new(dimension: Dimension, description: String, evidence_count: usize) -> Self {
        Self { dimension, description, evidence_count }
    }
}

pub struct WhiteSpaceAnalyzer<'a> {
    lexicon: &'a Lexicon,
    config: &'a WhiteSpaceConfig,
}

impl<'a> WhiteSpaceAnalyzer<'a> {
    pub fn new(lexicon: &'a Lexicon, config: &'a WhiteSpaceConfig) -> Self {
        Self { lexicon, config }
    }

    pub fn analyze(&self, target: &str, assets: &[CanonicalAsset]) -> Vec<WhiteSpaceFlag> {
        if assets.is_empty() {
            return Vec::new();
        }
        let mut flags = Vec::new();
        self.modality_gaps(target, assets, &mut flags);
        self.indication_gaps(assets, &mut flags);
        self.mechanism_gaps(target, assets, &mut flags);
        self.phase_gaps(assets, &mut flags);
        geography_gaps(assets, &mut flags);
        tracing::debug!("{} white-space flags for {}", flags.len(), target);
        flags
    }

    // ── Modality ─────────────────────────────────────────────────────────────

    fn modality_gaps(&self, target: &str, assets: &[CanonicalAsset], flags: &mut Vec<WhiteSpaceFlag>) {
        for term in self.lexicon.modality.terms() {
            if term.eq_ignore_ascii_case(CATCH_ALL_MODALITY) { continue; }
            let holders: Vec<_> = assets
                .iter()
                .filter(|a| a.modality.is_controlled() && a.modality.label.eq_ignore_ascii_case(term))
                .collect();
            if holders.is_empty() {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Modality,
                    format!("No {term} assets in development against {target}"),
                    0,
                ));
            } else if !holders.iter().any(|a| a.phase.is_late_stage()) {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Modality,
                    format!("{term} is early-stage only: {} asset(s), none at Phase II or later", holders.len()),
                    holders.len(),
                ));
            }
        }

        let unnormalized = count_labels(assets.iter().filter_map(|a| {
            (a.modality.status == TermStatus::Unnormalized).then_some(a.modality.label.as_str())
        }));
        for (label, count) in unnormalized {
            if count <= self.config.rare_modality_max {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Modality,
                    format!("Novel modality \"{label}\" pursued by {count} asset(s)"),
                    count,
                ));
            }
        }
    }

    // ── Indication ───────────────────────────────────────────────────────────

    fn indication_gaps(&self, assets: &[CanonicalAsset], flags: &mut Vec<WhiteSpaceFlag>) {
        let distinct: BTreeSet<String> = assets
            .iter()
            .map(|a| name_key(&a.indication))
            .filter(|k| !k.is_empty())
            .collect();
        if distinct.len() < self.config.min_indications {
            flags.push(WhiteSpaceFlag::new(
                Dimension::Indication,
                format!(
                    "Only {} distinct indication(s) pursued; other diseases are open",
                    distinct.len()
                ),
                distinct.len(),
            ));
        }

        let pursued: Vec<String> = assets
            .iter()
            .map(|a| a.indication.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();
        for known in &self.config.known_indications {
            let k = known.trim().to_lowercase();
            if k.is_empty() { continue; }
            let covered = pursued.iter().any(|i| i.contains(&k) || k.contains(i.as_str()));
            if !covered {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Indication,
                    format!("No assets in development for {}", known.trim()),
                    0,
                ));
            }
        }
    }

    // ── Mechanism ────────────────────────────────────────────────────────────

    fn mechanism_gaps(&self, target: &str, assets: &[CanonicalAsset], flags: &mut Vec<WhiteSpaceFlag>) {
        let counts = count_labels(
            assets
                .iter()
                .filter(|a| !a.mechanism.is_unknown())
                .map(|a| a.mechanism.label.as_str()),
        );
        for (label, count) in &counts {
            if *count == 1 {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Mechanism,
                    format!("Mechanism \"{label}\" is pursued by a single asset"),
                    1,
                ));
            }
        }

        for rule in self.lexicon.mechanism.scoped_to(target) {
            let held = assets
                .iter()
                .any(|a| a.mechanism.is_controlled() && a.mechanism.label.eq_ignore_ascii_case(&rule.term));
            if !held {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Mechanism,
                    format!("No assets pursue {}", rule.term),
                    0,
                ));
            }
        }
    }

    // ── Phase ────────────────────────────────────────────────────────────────

    fn phase_gaps(&self, assets: &[CanonicalAsset], flags: &mut Vec<WhiteSpaceFlag>) {
        for phase in Phase::ALL {
            let count = assets.iter().filter(|a| a.phase == phase).count();
            if count < self.config.min_assets_per_phase {
                flags.push(WhiteSpaceFlag::new(
                    Dimension::Phase,
                    format!("{phase} is thinly populated: {count} asset(s)"),
                    count,
                ));
            }
        }
    }
}

// ── Geography ────────────────────────────────────────────────────────────────

fn geography_gaps(assets: &[CanonicalAsset], flags: &mut Vec<WhiteSpaceFlag>) {
    let regional: BTreeSet<Region> = assets
        .iter()
        .flat_map(CanonicalAsset::regions)
        .filter(Region::is_regional)
        .collect();
    if regional.len() != 1 {
        return;
    }
    let Some(region) = regional.into_iter().next() else { return };
    let evidence = assets.iter().filter(|a| a.regions().contains(&region)).count();
    flags.push(WhiteSpaceFlag::new(
        Dimension::Geography,
        format!("All registry activity is in {}; other regions show no trials", region.as_str()),
        evidence,
    ));
}

/// Case-insensitive label counts, keyed and ordered by first-seen spelling.
pub(crate) fn count_labels<'s>(labels: impl Iterator<Item = &'s str>) -> Vec<(&'s str, usize)> {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        let key = label.to_lowercase();
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((label, 1));
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdmap_common::{SourceTag, Term};

    fn asset(name: &str, phase: Phase, modality: Term, indication: &str, source: SourceTag) -> CanonicalAsset {
        CanonicalAsset {
            name: name.to_string(),
            aliases: BTreeSet::new(),
            sponsor: String::new(),
            modality,
            mechanism: Term::unknown(),
            indication: indication.to_string(),
            phase,
            status: None,
            acquisition: false,
            acquisition_notes: vec![],
            sources: BTreeSet::from([source]),
            source_records: BTreeSet::new(),
            reported_at: None,
        }
    }

    fn flags_for(target: &str, assets: &[CanonicalAsset], config: &WhiteSpaceConfig) -> Vec<WhiteSpaceFlag> {
        let lex = Lexicon::builtin().unwrap();
        WhiteSpaceAnalyzer::new(&lex, config).analyze(target, assets)
    }

    fn of(flags: &[WhiteSpaceFlag], dim: Dimension) -> Vec<&WhiteSpaceFlag> {
        flags.iter().filter(|f| f.dimension == dim).collect()
    }

    #[test]
    fn test_empty_set_has_no_flags() {
        assert!(flags_for("CD47", &[], &WhiteSpaceConfig::default()).is_empty());
    }

    #[test]
    fn test_flags_follow_dimension_order() {
        let assets = vec![asset("A", Phase::PhaseI, Term::controlled("mAb"), "AML", SourceTag::ClinicalTrials)];
        let flags = flags_for("CD47", &assets, &WhiteSpaceConfig::default());
        let dims: Vec<_> = flags.iter().map(|f| f.dimension).collect();
        let mut sorted = dims.clone();
        sorted.sort();
        assert_eq!(dims, sorted);
        assert!(dims.contains(&Dimension::Geography));
    }

    #[test]
    fn test_modality_absent_and_early_only() {
        let assets = vec![
            asset("A", Phase::PhaseI, Term::controlled("mAb"), "AML", SourceTag::PubMed),
            asset("B", Phase::Preclinical, Term::controlled("mAb"), "MDS", SourceTag::PubMed),
            asset("C", Phase::PhaseIII, Term::controlled("ADC"), "NSCLC", SourceTag::PubMed),
        ];
        let flags = flags_for("CD47", &assets, &WhiteSpaceConfig::default());
        let modality = of(&flags, Dimension::Modality);
        let mab = modality.iter().find(|f| f.description.starts_with("mAb")).unwrap();
        assert_eq!(mab.evidence_count, 2);
        assert!(!modality.iter().any(|f| f.description.contains("ADC")));
        assert!(modality.iter().any(|f| f.description == "No Cell Therapy assets in development against CD47"));
        assert!(!modality.iter().any(|f| f.description.contains("Other")));
    }

    #[test]
    fn test_novel_modality_only_when_rare() {
        let solo = vec![
            asset("A", Phase::PhaseII, Term::passthrough("Exotic-Peptide-Conjugate"), "AML", SourceTag::PubMed),
            asset("B", Phase::PhaseII, Term::controlled("mAb"), "AML", SourceTag::PubMed),
        ];
        let flags = flags_for("CD47", &solo, &WhiteSpaceConfig::default());
        assert!(flags.iter().any(|f| f.description.contains("Exotic-Peptide-Conjugate") && f.evidence_count == 1));

        let shared = vec![
            asset("A", Phase::PhaseII, Term::passthrough("Exotic-Peptide-Conjugate"), "AML", SourceTag::PubMed),
            asset("B", Phase::PhaseII, Term::passthrough("exotic-peptide-conjugate"), "MDS", SourceTag::PubMed),
        ];
        let flags = flags_for("CD47", &shared, &WhiteSpaceConfig::default());
        assert!(!flags.iter().any(|f| f.description.to_lowercase().contains("exotic-peptide-conjugate")));
    }

    #[test]
    fn test_indication_breadth_and_known_indications() {
        let config = WhiteSpaceConfig {
            known_indications: vec!["Acute Myeloid Leukemia".into(), "Ovarian cancer".into()],
            ..WhiteSpaceConfig::default()
        };
        let assets = vec![
            asset("A", Phase::PhaseII, Term::unknown(), "Relapsed acute myeloid leukemia", SourceTag::PubMed),
            asset("B", Phase::PhaseII, Term::unknown(), "", SourceTag::PubMed),
        ];
        let flags = flags_for("CD47", &assets, &config);
        let ind = of(&flags, Dimension::Indication);
        assert_eq!(ind.len(), 2);
        assert_eq!(ind[0].evidence_count, 1);
        assert_eq!(ind[1].description, "No assets in development for Ovarian cancer");
        assert_eq!(ind[1].evidence_count, 0);
    }

    #[test]
    fn test_mechanism_singletons_and_scoped_gaps() {
        let mut a = asset("A", Phase::PhaseII, Term::unknown(), "AML", SourceTag::PubMed);
        a.mechanism = Term::controlled("CD47 Blockade");
        let mut b = asset("B", Phase::PhaseII, Term::unknown(), "AML", SourceTag::PubMed);
        b.mechanism = Term::controlled("CD47 Blockade");
        let mut c = asset("C", Phase::PhaseI, Term::unknown(), "AML", SourceTag::PubMed);
        c.mechanism = Term::passthrough("Macrophage checkpoint reprogramming");

        let flags = flags_for("CD47", &[a, b, c], &WhiteSpaceConfig::default());
        let mech: Vec<_> = of(&flags, Dimension::Mechanism).iter().map(|f| f.description.clone()).collect();
        assert_eq!(
            mech,
            vec![
                "Mechanism \"Macrophage checkpoint reprogramming\" is pursued by a single asset".to_string(),
                "No assets pursue CD47/PD-1 Blockade".to_string(),
                "No assets pursue SIRPα-CD47 Blockade".to_string(),
            ]
        );
    }

    #[test]
    fn test_scoped_terms_ignored_for_other_targets() {
        let assets = vec![asset("A", Phase::PhaseII, Term::unknown(), "NSCLC", SourceTag::PubMed)];
        let flags = flags_for("KRAS", &assets, &WhiteSpaceConfig::default());
        assert!(of(&flags, Dimension::Mechanism).is_empty());
    }

    #[test]
    fn test_phase_counts_below_threshold() {
        let assets = vec![
            asset("A", Phase::PhaseII, Term::unknown(), "AML", SourceTag::PubMed),
            asset("B", Phase::PhaseII, Term::unknown(), "AML", SourceTag::PubMed),
            asset("C", Phase::Approved, Term::unknown(), "AML", SourceTag::PubMed),
        ];
        let flags = flags_for("CD47", &assets, &WhiteSpaceConfig::default());
        let phase: Vec<_> = of(&flags, Dimension::Phase).iter().map(|f| f.evidence_count).collect();
        // Preclinical, Phase I, Phase III, Approved
        assert_eq!(phase, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_geography_single_region() {
        let assets = vec![
            asset("A", Phase::PhaseII, Term::unknown(), "AML", SourceTag::ClinicalTrials),
            asset("B", Phase::PhaseII, Term::unknown(), "AML", SourceTag::ClinicalTrials),
            asset("C", Phase::PhaseII, Term::unknown(), "AML", SourceTag::PubMed),
        ];
        let flags = flags_for("CD47", &assets, &WhiteSpaceConfig::default());
        let geo = of(&flags, Dimension::Geography);
        assert_eq!(geo.len(), 1);
        assert_eq!(geo[0].evidence_count, 2);
        assert!(geo[0].description.contains("North America"));
    }

    #[test]
    fn test_geography_multiple_or_no_regions() {
        let both = vec![
            asset("A", Phase::PhaseII, Term::unknown(), "AML", SourceTag::ClinicalTrials),
            asset("B", Phase::PhaseII, Term::unknown(), "AML", SourceTag::Euctr),
        ];
        assert!(of(&flags_for("CD47", &both, &WhiteSpaceConfig::default()), Dimension::Geography).is_empty());

        let global = vec![asset("A", Phase::PhaseII, Term::unknown(), "AML", SourceTag::GooglePatents)];
        assert!(of(&flags_for("CD47", &global, &WhiteSpaceConfig::default()), Dimension::Geography).is_empty());
    }
}
