use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{EntryKind, Pathology, Treatment, TreatmentType};
use crate::scoring::{ScoreBreakdown, ScoreTier, TrialSummary};
use crate::search::TitleSegment;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Free-text query, e.g. "migraine chronique" or "betabloquant".
    pub query: String,
    /// Maximum number of results to return (default: 12, max: 50).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTreatmentParams {
    /// Treatment slug such as "propranolol".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetPathologyParams {
    /// Pathology slug such as "migraine-chronique".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListCategoryParams {
    /// Treatment category slug or label, e.g. "triptans".
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RankTreatmentsParams {
    /// Restrict to one treatment type ("maintenance", "abortive", "emergency", "other"
    /// or the French data label).
    pub treatment_type: Option<String>,
    /// Restrict to treatments in this category (slug or label).
    pub category: Option<String>,
    /// Row order: "score" (default, grouped by type) or "price" (cheapest first).
    pub order: Option<RankOrder>,
    /// Maximum number of rows (default: all).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MidasParams {
    /// Days lost over the last three months, one count per MIDAS question (5 values).
    pub days: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Hit6Params {
    /// Points per HIT-6 question (6 values, each 6, 8, 10, 11 or 13).
    pub answers: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    /// Grouped by treatment type, best score first.
    #[default]
    Score,
    /// Cheapest first; free pricing and products not sold in France last.
    Price,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHit {
    pub kind: EntryKind,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub href: String,
    pub score: u32,
    /// Title split around the matched query tokens.
    pub highlight: Vec<TitleSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchGroup {
    pub kind: EntryKind,
    pub items: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
    pub query: String,
    /// Ranked results, best first.
    pub results: Vec<SearchHit>,
    /// Same results bucketed by kind in display order.
    pub groups: Vec<SearchGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TreatmentSummary {
    pub slug: String,
    pub name: String,
    pub treatment_type: TreatmentType,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub prescription: String,
    pub price: String,
    pub refund: String,
    pub score: u8,
    pub tier: ScoreTier,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TreatmentDetailResponse {
    pub treatment: Treatment,
    pub score: ScoreBreakdown,
    pub trials: TrialSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryListResponse {
    pub slug: String,
    pub title: String,
    pub treatments: Vec<TreatmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PathologyDetailResponse {
    pub pathology: Pathology,
    /// Treatments listing this pathology among their categories.
    pub treatments: Vec<TreatmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RankedTreatment {
    pub treatment: TreatmentSummary,
    pub trial_count: usize,
    pub total_sample_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RankTreatmentsResponse {
    pub treatments: Vec<RankedTreatment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadDataResponse {
    pub updated: bool,
    /// SHA-256 of the data files currently loaded.
    pub fingerprint: String,
    pub pathology_count: usize,
    pub treatment_count: usize,
    pub entry_count: usize,
}
