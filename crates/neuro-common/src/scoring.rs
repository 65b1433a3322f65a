//! Global treatment score (0–100).
//!
//! Five factors, each in [0, 1], weighted by treatment type:
//!
//! - clinical: quality-weighted mean outcome, damped by result coherence
//! - safety: quality-weighted mean tolerance signal
//! - sample size, trial count: log-ratio against the best peer
//! - duration: years covered, linear ratio against the best peer
//!
//! Peers are the treatments sharing the scored treatment's type.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Outcome, Treatment, Trial};
use crate::weights::TypeWeights;

/// Study design read from a trial's free-text descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyDesign {
    Unspecified,
    DoubleBlindRandomized,
    DoubleBlindRandomizedMulticenter,
    OpenLabel,
    Other,
}

impl StudyDesign {
    pub fn classify(descriptor: Option<&str>) -> Self {
        let Some(descriptor) = descriptor.filter(|d| !d.is_empty()) else {
            return StudyDesign::Unspecified;
        };
        let text = descriptor.to_lowercase();
        if text.contains("randomisé") && text.contains("double-aveugle") {
            if text.contains("multicentrique") {
                return StudyDesign::DoubleBlindRandomizedMulticenter;
            }
            return StudyDesign::DoubleBlindRandomized;
        }
        if text.contains("ouvert") {
            return StudyDesign::OpenLabel;
        }
        StudyDesign::Other
    }

    pub fn quality_factor(self) -> f64 {
        match self {
            StudyDesign::Unspecified => 1.0,
            StudyDesign::DoubleBlindRandomized => 1.0,
            StudyDesign::DoubleBlindRandomizedMulticenter => 1.05,
            StudyDesign::OpenLabel => 0.9,
            StudyDesign::Other => 0.95,
        }
    }
}

const GOOD_TOLERANCE_PHRASES: &[&str] = &[
    "meilleure tolérance",
    "bien toléré",
    "comparable au placebo",
];

const POOR_TOLERANCE_PHRASES: &[&str] = &[
    "mauvaise tolérance",
    "plus d'effets indésirables",
    "alerte",
];

/// Tolerance signal read from a trial's result summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetySignal {
    Favorable,
    Unfavorable,
    Silent,
}

impl SafetySignal {
    /// Favorable phrases win when both kinds appear.
    pub fn classify(summary: Option<&str>) -> Self {
        let Some(summary) = summary else {
            return SafetySignal::Silent;
        };
        let text = summary.to_lowercase();
        if GOOD_TOLERANCE_PHRASES.iter().any(|p| text.contains(p)) {
            SafetySignal::Favorable
        } else if POOR_TOLERANCE_PHRASES.iter().any(|p| text.contains(p)) {
            SafetySignal::Unfavorable
        } else {
            SafetySignal::Silent
        }
    }

    pub fn value(self) -> f64 {
        match self {
            SafetySignal::Favorable => 1.0,
            SafetySignal::Unfavorable => -1.0,
            SafetySignal::Silent => 0.0,
        }
    }
}

fn quality_of(trial: &Trial) -> f64 {
    StudyDesign::classify(trial.quality_descriptor.as_deref()).quality_factor()
}

/// Aggregates over a treatment's trials. Trials without a year or sample
/// size are left out of the corresponding aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrialSummary {
    pub trial_count: usize,
    pub total_sample_size: u64,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl TrialSummary {
    pub fn from_trials(trials: &[Trial]) -> Self {
        let mut summary = TrialSummary {
            trial_count: trials.len(),
            ..Default::default()
        };
        for trial in trials {
            if let Some(n) = trial.sample_size {
                summary.total_sample_size += u64::from(n);
            }
            if let Some(year) = trial.year {
                summary.first_year = Some(summary.first_year.map_or(year, |y| y.min(year)));
                summary.last_year = Some(summary.last_year.map_or(year, |y| y.max(year)));
            }
            match trial.outcome {
                Some(Outcome::Positive) => summary.positive += 1,
                Some(Outcome::Negative) => summary.negative += 1,
                Some(Outcome::Neutral) => summary.neutral += 1,
                None => {}
            }
        }
        summary
    }

    /// Inclusive span in years, 0 when no trial carries a year.
    pub fn duration_years(&self) -> u32 {
        match (self.first_year, self.last_year) {
            (Some(first), Some(last)) => {
                let span = i64::from(last) - i64::from(first) + 1;
                u32::try_from(span.max(0)).unwrap_or(u32::MAX)
            }
            _ => 0,
        }
    }

    /// Share of trials in the largest outcome bucket.
    pub fn coherence(&self) -> f64 {
        if self.trial_count == 0 {
            return 1.0;
        }
        let largest = self.positive.max(self.negative).max(self.neutral);
        largest as f64 / self.trial_count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Low,
    Medium,
    High,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        if score >= 66 {
            ScoreTier::High
        } else if score < 33 {
            ScoreTier::Low
        } else {
            ScoreTier::Medium
        }
    }
}

/// Every intermediate value behind a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub tier: ScoreTier,
    pub clinical: f64,
    pub safety: f64,
    pub sample_size: f64,
    pub trial_count: f64,
    pub duration: f64,
    pub coherence: f64,
    pub weights: TypeWeights,
}

/// `ln(value + 1) / ln(max + 1)`, 0 when `max` is 0.
fn log_ratio(value: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    ((value + 1) as f64).ln() / ((max + 1) as f64).ln()
}

struct PeerMaxima {
    trial_count: u64,
    sample_size: u64,
    duration: u32,
}

impl PeerMaxima {
    /// The scored treatment always counts as its own peer, so every relative
    /// factor stays within [0, 1].
    fn compute(treatment: &Treatment, own: &TrialSummary, peer_group: &[Treatment]) -> Self {
        let mut maxima = PeerMaxima {
            trial_count: own.trial_count as u64,
            sample_size: own.total_sample_size,
            duration: own.duration_years(),
        };
        for peer in peer_group
            .iter()
            .filter(|p| p.treatment_type == treatment.treatment_type)
        {
            let summary = TrialSummary::from_trials(&peer.trials);
            maxima.trial_count = maxima.trial_count.max(summary.trial_count as u64);
            maxima.sample_size = maxima.sample_size.max(summary.total_sample_size);
            maxima.duration = maxima.duration.max(summary.duration_years());
        }
        maxima
    }
}

/// Computes the score together with its factors.
///
/// `peer_group` may contain treatments of other types; they are ignored.
pub fn score_breakdown(treatment: &Treatment, peer_group: &[Treatment]) -> ScoreBreakdown {
    let weights = TypeWeights::for_type(treatment.treatment_type);
    let trials = &treatment.trials;

    if trials.is_empty() {
        return ScoreBreakdown {
            score: 0,
            tier: ScoreTier::from_score(0),
            clinical: 0.0,
            safety: 0.0,
            sample_size: 0.0,
            trial_count: 0.0,
            duration: 0.0,
            coherence: 0.0,
            weights,
        };
    }

    let n = trials.len() as f64;
    let summary = TrialSummary::from_trials(trials);

    let (clinical_sum, safety_sum) = trials.iter().fold((0.0, 0.0), |(clin, safe), trial| {
        let quality = quality_of(trial);
        let outcome = trial.outcome.map_or(0.0, Outcome::value);
        let safety = SafetySignal::classify(trial.outcome_summary.as_deref()).value();
        (clin + outcome * quality, safe + safety * quality)
    });

    let coherence = summary.coherence();
    let clinical = (clinical_sum / n * coherence + 1.0) / 2.0;
    let safety = (safety_sum / n + 1.0) / 2.0;

    let maxima = PeerMaxima::compute(treatment, &summary, peer_group);
    let trial_count = log_ratio(summary.trial_count as u64, maxima.trial_count);
    let sample_size = log_ratio(summary.total_sample_size, maxima.sample_size);
    let duration = if maxima.duration == 0 {
        0.0
    } else {
        f64::from(summary.duration_years()) / f64::from(maxima.duration)
    };

    let weighted = weights.clinical * clinical
        + weights.safety * safety
        + weights.sample_size * sample_size
        + weights.trial_count * trial_count
        + weights.duration * duration;

    // half-up; multicenter quality can push the clinical factor just above 1
    let score = (weighted * 100.0 + 0.5).floor().clamp(0.0, 100.0) as u8;

    ScoreBreakdown {
        score,
        tier: ScoreTier::from_score(score),
        clinical,
        safety,
        sample_size,
        trial_count,
        duration,
        coherence,
        weights,
    }
}

/// Global score in [0, 100] of `treatment` among `peer_group`.
pub fn compute_score(treatment: &Treatment, peer_group: &[Treatment]) -> u8 {
    score_breakdown(treatment, peer_group).score
}
