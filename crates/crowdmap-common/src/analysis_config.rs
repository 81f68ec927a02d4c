//! Analysis configuration: phase weights and white-space thresholds.
//!
//! Loaded from YAML/JSON on its own, or embedded as the `[analysis]` table of
//! the agent's `crowdmap.toml`. Every field has a serde default, so an empty
//! document yields the standard methodology.

use serde::{Deserialize, Serialize};

use crate::entities::Phase;
use crate::error::{CrowdmapError, Result};

/// Complete per-run analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Phase weights for the crowding score
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Gap-detection thresholds
    #[serde(default)]
    pub whitespace: WhiteSpaceConfig,
}

// ── Scoring Configuration ─────────────────────────────────────────────────────

/// Weight given to one asset at each development phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_preclinical_weight")]
    pub preclinical: f64,

    #[serde(default = "default_phase_1_weight")]
    pub phase_1: f64,

    #[serde(default = "default_phase_2_weight")]
    pub phase_2: f64,

    #[serde(default = "default_phase_3_weight")]
    pub phase_3: f64,

    #[serde(default = "default_approved_weight")]
    pub approved: f64,
}

fn default_preclinical_weight() -> f64 { 0.2 }
fn default_phase_1_weight() -> f64 { 0.4 }
fn default_phase_2_weight() -> f64 { 0.6 }
fn default_phase_3_weight() -> f64 { 0.8 }
fn default_approved_weight() -> f64 { 1.0 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preclinical: default_preclinical_weight(),
            phase_1: default_phase_1_weight(),
            phase_2: default_phase_2_weight(),
            phase_3: default_phase_3_weight(),
            approved: default_approved_weight(),
        }
    }
}

impl ScoringConfig {
    pub fn weight(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Preclinical => self.preclinical,
            Phase::PhaseI      => self.phase_1,
            Phase::PhaseII     => self.phase_2,
            Phase::PhaseIII    => self.phase_3,
            Phase::Approved    => self.approved,
        }
    }

    /// Weights in [`Phase::ALL`] order.
    pub fn as_array(&self) -> [f64; 5] {
        [self.preclinical, self.phase_1, self.phase_2, self.phase_3, self.approved]
    }

    /// Weights must lie in [0, 1], never decrease with maturity, and the
    /// Approved weight must be positive (it is the normalisation denominator).
    pub fn validate(&self) -> Result<()> {
        let weights = self.as_array();
        for (phase, w) in Phase::ALL.iter().zip(weights.iter()) {
            if !(0.0..=1.0).contains(w) {
                return Err(CrowdmapError::Config(format!(
                    "weight for {phase} must be within [0, 1], got {w}"
                )));
            }
        }
        for pair in Phase::ALL.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if self.weight(hi) < self.weight(lo) {
                return Err(CrowdmapError::Config(format!(
                    "weight for {hi} ({}) is below weight for {lo} ({})",
                    self.weight(hi),
                    self.weight(lo)
                )));
            }
        }
        if self.approved <= 0.0 {
            return Err(CrowdmapError::Config("Approved weight must be positive".to_string()));
        }
        Ok(())
    }
}

// ── White-Space Configuration ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteSpaceConfig {
    /// Fewer distinct indications than this raises an indication flag
    #[serde(default = "default_min_indications")]
    pub min_indications: usize,

    /// A phase holding fewer assets than this raises a phase flag
    #[serde(default = "default_min_assets_per_phase")]
    pub min_assets_per_phase: usize,

    /// Unrecognised modalities held by at most this many assets are flagged as novel
    #[serde(default = "default_rare_modality_max")]
    pub rare_modality_max: usize,

    /// Disease associations expected for the target; uncovered ones are flagged
    #[serde(default)]
    pub known_indications: Vec<String>,
}

fn default_min_indications() -> usize { 3 }
fn default_min_assets_per_phase() -> usize { 2 }
fn default_rare_modality_max() -> usize { 1 }

impl Default for WhiteSpaceConfig {
    fn default() -> Self {
        Self {
            min_indications: default_min_indications(),
            min_assets_per_phase: default_min_assets_per_phase(),
            rare_modality_max: default_rare_modality_max(),
            known_indications: vec![],
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl AnalysisConfig {
    /// Load from YAML file
    pub fn from_yaml(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()
    }
}
