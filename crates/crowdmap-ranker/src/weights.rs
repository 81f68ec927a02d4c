//! Phase weights for the crowding score.

use serde::{Deserialize, Serialize};

use crowdmap_common::{Phase, ScoringConfig};

/// Weight per phase, indexed in [`Phase::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseWeights {
    weights: [f64; 5],
}

impl Default for PhaseWeights {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl PhaseWeights {
    /// Takes the weights as given; validation happens when the config is loaded.
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self { weights: config.as_array() }
    }

    pub fn weight(&self, phase: Phase) -> f64 {
        self.weights[phase.index()]
    }

    /// Weight of the most mature phase; one asset's maximum contribution.
    pub fn max_weight(&self) -> f64 {
        self.weight(Phase::Approved)
    }

    /// "Preclinical=0.2, Phase I=0.4, ..." for the report methodology.
    pub fn describe(&self) -> String {
        Phase::ALL
            .iter()
            .map(|p| format!("{}={}", p, self.weight(*p)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
