//! Loads the site's JSON data files into the core model.
//!
//! Files of the wrong shape degrade to empty collections with a warning;
//! only unreadable files and invalid JSON are errors.
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::AppError;
use neuro_common::model::{Outcome, Pathology, Treatment, TreatmentType, Trial, UNKNOWN};
use neuro_common::text::{normalize, slugify};

static LEADING_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid regex"));

pub fn read_json(path: &Path) -> Result<Value, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_treatments(path: &Path) -> Result<Vec<Treatment>, AppError> {
    Ok(parse_treatments(&read_json(path)?))
}

pub fn load_pathologies(path: &Path) -> Result<Vec<Pathology>, AppError> {
    Ok(parse_pathologies(&read_json(path)?))
}

/// `{ "<molecule>": { description_molecule, marques, type_de_traitement,
/// categories, effets_indesirables, essais_cliniques, prescription, Prix,
/// Remboursement }, ... }`
pub fn parse_treatments(root: &Value) -> Vec<Treatment> {
    let Some(molecules) = root.as_object() else {
        warn!("treatments data is not an object, using an empty list");
        return Vec::new();
    };

    molecules
        .iter()
        .map(|(name, data)| {
            let empty = Map::new();
            let data = data.as_object().unwrap_or(&empty);
            Treatment {
                slug: slugify(name),
                name: name.clone(),
                description: text_field(data, "description_molecule").unwrap_or_default(),
                treatment_type: text_field(data, "type_de_traitement")
                    .map(|label| TreatmentType::from_label(&label))
                    .unwrap_or(TreatmentType::Other),
                categories: string_list(data.get("categories")),
                brands: string_list(data.get("marques")),
                prescription: text_field(data, "prescription")
                    .or_else(|| text_field(data, "Prescription"))
                    .map(|p| capitalize_first(&p))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                price: data
                    .get("Prix")
                    .and_then(format_price)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                refund: data
                    .get("Remboursement")
                    .and_then(scalar_text)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                side_effects: string_list(data.get("effets_indesirables")),
                trials: data
                    .get("essais_cliniques")
                    .and_then(Value::as_array)
                    .map(|trials| trials.iter().filter_map(parse_trial).collect())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn parse_trial(value: &Value) -> Option<Trial> {
    let trial = value.as_object()?;
    Some(Trial {
        name: text_field(trial, "Essai"),
        year: trial
            .get("Année")
            .and_then(leading_int)
            .and_then(|y| i32::try_from(y).ok())
            .filter(|y| *y >= 0),
        sample_size: trial
            .get("Effectif (randomisé)")
            .and_then(leading_int)
            .and_then(|n| u32::try_from(n).ok()),
        quality_descriptor: text_field(trial, "Type"),
        outcome_summary: text_field(trial, "Résultat principal (résumé)"),
        outcome: trial.get("Score").and_then(parse_outcome),
        source_url: text_field(trial, "Source(lien)"),
    })
}

/// Integer prefix of a number or string: `"120 patients"` gives 120,
/// `12.7` gives 12, `"n/a"` gives nothing.
pub fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => LEADING_INT_RE
            .captures(s)
            .and_then(|caps| caps[1].parse().ok()),
        _ => None,
    }
}

fn parse_outcome(value: &Value) -> Option<Outcome> {
    let score = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Outcome::from_score(score)
}

/// `{ "<super category>": { "<category>": [ { name, description }, ... ] } }`,
/// flattened and sorted by name. Items without a name are skipped.
pub fn parse_pathologies(root: &Value) -> Vec<Pathology> {
    let Some(families) = root.as_object() else {
        warn!("pathologies data is not an object, using an empty list");
        return Vec::new();
    };

    let mut pathologies = Vec::new();
    for (super_category, categories) in families {
        let Some(categories) = categories.as_object() else {
            continue;
        };
        for (category, items) in categories {
            let Some(items) = items.as_array() else {
                continue;
            };
            for item in items.iter().filter_map(Value::as_object) {
                let Some(name) = text_field(item, "name") else {
                    continue;
                };
                pathologies.push(Pathology {
                    slug: slugify(&name),
                    description: text_field(item, "description").unwrap_or_default(),
                    category: category.clone(),
                    super_category: super_category.clone(),
                    name,
                });
            }
        }
    }

    pathologies.sort_by_cached_key(|p| (normalize(&p.name), p.name.clone()));
    pathologies
}

/// Euro display price: numbers become French currency strings
/// (`12.5` gives `"12,50 €"`), `"libre"` becomes `"Libre"`, other text is kept.
fn format_price(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(format_eur),
        Value::String(s) if s == "libre" => Some("Libre".to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn format_eur(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('\u{202f}');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped},{:02}\u{a0}€", cents % 100)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Non-empty string, or a number rendered as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
