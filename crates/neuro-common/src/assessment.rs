//! Headache disability questionnaires: MIDAS and HIT-6.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MIDAS_QUESTIONS: usize = 5;
/// Upper bound of a single MIDAS day count.
pub const MIDAS_MAX_DAYS: u32 = 365;
pub const HIT6_QUESTIONS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error("expected {expected} answers, got {got}")]
    AnswerCount { expected: usize, got: usize },

    #[error("answer {question} is out of range: {value}")]
    OutOfRange { question: usize, value: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MidasGrade {
    /// Grade I, total 0 to 5.
    Minimal,
    /// Grade II, 6 to 10.
    Mild,
    /// Grade III, 11 to 20.
    Moderate,
    /// Grade IV, 21 and above.
    Severe,
}

impl MidasGrade {
    pub fn from_total(total: u32) -> Self {
        match total {
            0..=5 => MidasGrade::Minimal,
            6..=10 => MidasGrade::Mild,
            11..=20 => MidasGrade::Moderate,
            _ => MidasGrade::Severe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MidasGrade::Minimal => "Aucune ou légère invalidité",
            MidasGrade::Mild => "Invalidité légère",
            MidasGrade::Moderate => "Invalidité modérée",
            MidasGrade::Severe => "Invalidité sévère",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MidasResult {
    pub total: u32,
    pub grade: MidasGrade,
    pub label: String,
}

/// Sums the five day counts of the last three months.
pub fn midas(days: &[u32]) -> Result<MidasResult, AssessmentError> {
    if days.len() != MIDAS_QUESTIONS {
        return Err(AssessmentError::AnswerCount {
            expected: MIDAS_QUESTIONS,
            got: days.len(),
        });
    }
    if let Some((i, &value)) = days.iter().enumerate().find(|(_, d)| **d > MIDAS_MAX_DAYS) {
        return Err(AssessmentError::OutOfRange {
            question: i + 1,
            value,
        });
    }

    let total = days.iter().sum();
    let grade = MidasGrade::from_total(total);
    Ok(MidasResult {
        total,
        grade,
        label: grade.label().to_string(),
    })
}

/// Frequency answer to one HIT-6 question, worth the listed points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Hit6Answer {
    Never,
    Rarely,
    Sometimes,
    VeryOften,
    Always,
}

impl Hit6Answer {
    pub fn from_points(points: u32) -> Option<Self> {
        match points {
            6 => Some(Hit6Answer::Never),
            8 => Some(Hit6Answer::Rarely),
            10 => Some(Hit6Answer::Sometimes),
            11 => Some(Hit6Answer::VeryOften),
            13 => Some(Hit6Answer::Always),
            _ => None,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Hit6Answer::Never => 6,
            Hit6Answer::Rarely => 8,
            Hit6Answer::Sometimes => 10,
            Hit6Answer::VeryOften => 11,
            Hit6Answer::Always => 13,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Hit6Impact {
    /// 49 or less.
    Little,
    /// 50 to 55.
    Moderate,
    /// 56 to 59.
    Substantial,
    /// 60 and above.
    Severe,
}

impl Hit6Impact {
    pub fn from_total(total: u32) -> Self {
        match total {
            0..=49 => Hit6Impact::Little,
            50..=55 => Hit6Impact::Moderate,
            56..=59 => Hit6Impact::Substantial,
            _ => Hit6Impact::Severe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Hit6Impact::Little => "faible ou nul",
            Hit6Impact::Moderate => "modéré",
            Hit6Impact::Substantial => "significatif",
            Hit6Impact::Severe => "sévère",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Hit6Result {
    /// Between 36 and 78.
    pub total: u32,
    pub impact: Hit6Impact,
    pub label: String,
}

/// Scores six answers given as points (6, 8, 10, 11 or 13). Every question
/// must be answered.
pub fn hit6(points: &[u32]) -> Result<Hit6Result, AssessmentError> {
    if points.len() != HIT6_QUESTIONS {
        return Err(AssessmentError::AnswerCount {
            expected: HIT6_QUESTIONS,
            got: points.len(),
        });
    }
    let mut total = 0;
    for (i, &value) in points.iter().enumerate() {
        let answer = Hit6Answer::from_points(value).ok_or(AssessmentError::OutOfRange {
            question: i + 1,
            value,
        })?;
        total += answer.points();
    }

    let impact = Hit6Impact::from_total(total);
    Ok(Hit6Result {
        total,
        impact,
        label: impact.label().to_string(),
    })
}
