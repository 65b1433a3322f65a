//! Per-type weight profiles for the treatment score.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::TreatmentType;

/// The five factor weights. Each profile sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypeWeights {
    /// Quality- and coherence-weighted trial outcomes
    pub clinical: f64,
    /// Tolerance signal extracted from result summaries
    pub safety: f64,
    /// Summed randomized sample size, relative to peers
    pub sample_size: f64,
    /// Number of trials, relative to peers
    pub trial_count: f64,
    /// Years spanned by the trials, relative to peers
    pub duration: f64,
}

impl TypeWeights {
    pub const MAINTENANCE: TypeWeights = TypeWeights {
        clinical: 0.45,
        safety: 0.20,
        sample_size: 0.15,
        trial_count: 0.10,
        duration: 0.10,
    };

    pub const ABORTIVE: TypeWeights = TypeWeights {
        clinical: 0.55,
        safety: 0.15,
        sample_size: 0.15,
        trial_count: 0.10,
        duration: 0.05,
    };

    pub const EMERGENCY: TypeWeights = TypeWeights {
        clinical: 0.50,
        safety: 0.20,
        sample_size: 0.15,
        trial_count: 0.10,
        duration: 0.05,
    };

    pub const OTHER: TypeWeights = TypeWeights {
        clinical: 0.50,
        safety: 0.20,
        sample_size: 0.15,
        trial_count: 0.10,
        duration: 0.05,
    };

    pub fn for_type(treatment_type: TreatmentType) -> Self {
        match treatment_type {
            TreatmentType::Maintenance => Self::MAINTENANCE,
            TreatmentType::Abortive => Self::ABORTIVE,
            TreatmentType::Emergency => Self::EMERGENCY,
            TreatmentType::Other => Self::OTHER,
        }
    }

    /// Order: clinical, safety, sample size, trial count, duration.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.clinical,
            self.safety,
            self.sample_size,
            self.trial_count,
            self.duration,
        ]
    }

    /// Validate that all weights sum to ~1.0
    pub fn validate(&self) -> bool {
        let sum: f64 = self.as_array().iter().sum();
        (sum - 1.0).abs() < 1e-9
    }
}
