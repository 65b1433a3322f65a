use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A headache disorder page (e.g. "Migraine chronique").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pathology {
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Sub-category, e.g. "Migraine". Empty when unknown.
    pub category: String,
    /// Top-level family, e.g. "Céphalées primaires".
    pub super_category: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentType {
    /// Preventive, taken daily ("Traitement de fond").
    Maintenance,
    /// Taken during an attack ("Traitement de crise").
    Abortive,
    /// Administered at the emergency department ("Traitement aux urgences").
    Emergency,
    #[default]
    Other,
}

impl TreatmentType {
    pub const ALL: [TreatmentType; 4] = [
        TreatmentType::Maintenance,
        TreatmentType::Abortive,
        TreatmentType::Emergency,
        TreatmentType::Other,
    ];

    /// Recognised labels only: the English names and the French labels used
    /// in the data files.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "maintenance" | "traitement de fond" => Some(TreatmentType::Maintenance),
            "abortive" | "traitement de crise" => Some(TreatmentType::Abortive),
            "emergency" | "traitement aux urgences" => Some(TreatmentType::Emergency),
            "other" | "autre" => Some(TreatmentType::Other),
            _ => None,
        }
    }

    /// Like `parse_label`, with anything unrecognised falling back to `Other`.
    pub fn from_label(label: &str) -> Self {
        Self::parse_label(label).unwrap_or(TreatmentType::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentType::Maintenance => "maintenance",
            TreatmentType::Abortive => "abortive",
            TreatmentType::Emergency => "emergency",
            TreatmentType::Other => "other",
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary-endpoint verdict of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Negative,
    Neutral,
    Positive,
}

impl Outcome {
    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            -1 => Some(Outcome::Negative),
            0 => Some(Outcome::Neutral),
            1 => Some(Outcome::Positive),
            _ => None,
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Outcome::Negative => -1.0,
            Outcome::Neutral => 0.0,
            Outcome::Positive => 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Trial {
    pub name: Option<String>,
    pub year: Option<i32>,
    /// Randomized sample size.
    pub sample_size: Option<u32>,
    /// Free-text study design, e.g. "randomisé double-aveugle multicentrique".
    pub quality_descriptor: Option<String>,
    /// Free-text summary of the main result.
    pub outcome_summary: Option<String>,
    pub outcome: Option<Outcome>,
    pub source_url: Option<String>,
}

/// Shown for prescription, price and refund when the data file is silent.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Treatment {
    pub slug: String,
    /// Molecule name.
    pub name: String,
    pub description: String,
    pub treatment_type: TreatmentType,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    /// Prescription status, e.g. "Liste I".
    pub prescription: String,
    /// Display price, e.g. "12,50 €", "Libre" or "hors France".
    pub price: String,
    /// Refund rate, e.g. "65 %".
    pub refund: String,
    pub side_effects: Vec<String>,
    pub trials: Vec<Trial>,
}

impl Treatment {
    /// Display title: the molecule name, or the slug when the name is blank.
    pub fn title(&self) -> &str {
        if self.name.is_empty() {
            &self.slug
        } else {
            &self.name
        }
    }

    pub fn price_value(&self) -> Option<f64> {
        price_value(&self.price)
    }
}

/// Numeric value of a display price, for ordering. `None` for free pricing,
/// products not sold in France and anything without a number.
pub fn price_value(price: &str) -> Option<f64> {
    let text = price.to_lowercase();
    if text.contains("libre") || text.contains("hors france") {
        return None;
    }
    let digits: String = text
        .replacen(',', ".", 1)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().filter(|p| p.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Pathology,
    PathologyCategory,
    Treatment,
    Brand,
    Category,
}

impl EntryKind {
    /// Order in which grouped search results are displayed.
    pub const DISPLAY_ORDER: [EntryKind; 5] = [
        EntryKind::PathologyCategory,
        EntryKind::Category,
        EntryKind::Pathology,
        EntryKind::Treatment,
        EntryKind::Brand,
    ];

    pub fn is_category(self) -> bool {
        matches!(self, EntryKind::PathologyCategory | EntryKind::Category)
    }
}

/// One searchable record. Built by `index::build_index`, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexEntry {
    pub kind: EntryKind,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub normalized_text: String,
    pub squeezed_text: String,
    pub weight: u32,
    pub href: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treatment_type_accepts_both_vocabularies() {
        assert_eq!(TreatmentType::from_label("Traitement de fond"), TreatmentType::Maintenance);
        assert_eq!(TreatmentType::from_label("traitement de crise"), TreatmentType::Abortive);
        assert_eq!(TreatmentType::from_label("Traitement aux urgences"), TreatmentType::Emergency);
        assert_eq!(TreatmentType::from_label("Abortive"), TreatmentType::Abortive);
        assert_eq!(TreatmentType::from_label("Autre"), TreatmentType::Other);
        assert_eq!(TreatmentType::from_label("unknown"), TreatmentType::Other);
        assert_eq!(TreatmentType::parse_label(" autre "), Some(TreatmentType::Other));
        assert_eq!(TreatmentType::parse_label("unknown"), None);
        assert_eq!(TreatmentType::from_label(""), TreatmentType::Other);
    }

    #[test]
    fn price_value_skips_special_prices() {
        let priced = |price: &str| Treatment {
            price: price.to_string(),
            ..Default::default()
        };
        assert_eq!(priced("12,50\u{a0}€").price_value(), Some(12.5));
        assert_eq!(priced("1\u{202f}234,00\u{a0}€").price_value(), Some(1234.0));
        assert_eq!(priced("Libre").price_value(), None);
        assert_eq!(priced("hors France").price_value(), None);
        assert_eq!(priced(UNKNOWN).price_value(), None);
    }

    #[test]
    fn outcome_only_maps_unit_scores() {
        assert_eq!(Outcome::from_score(1), Some(Outcome::Positive));
        assert_eq!(Outcome::from_score(-1), Some(Outcome::Negative));
        assert_eq!(Outcome::from_score(0), Some(Outcome::Neutral));
        assert_eq!(Outcome::from_score(2), None);
    }

    #[test]
    fn entry_kind_serializes_camel_case() {
        let json = serde_json::to_string(&EntryKind::PathologyCategory).unwrap();
        assert_eq!(json, "\"pathologyCategory\"");
    }
}
