//! Loaded data plus everything derived from it: the search index and the
//! per-treatment scores. Rebuilt wholesale on reload.
use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use neuro_common::index::build_index;
use neuro_common::mcp_api::{
    CategoryListResponse, PathologyDetailResponse, RankOrder, RankedTreatment, SearchGroup,
    SearchHit, SearchResponse, TreatmentDetailResponse, TreatmentSummary,
};
use neuro_common::model::{price_value, IndexEntry, Pathology, Treatment, TreatmentType};
use neuro_common::scoring::{compute_score, score_breakdown, ScoreTier, TrialSummary};
use neuro_common::search::{group_by_kind, highlight_title, search, ScoredEntry};
use neuro_common::text::slugify;

pub struct Catalog {
    pathologies: Vec<Pathology>,
    treatments: Vec<Treatment>,
    index: Vec<IndexEntry>,
    scores: HashMap<String, u8>,
    fingerprint: String,
}

impl Catalog {
    /// Treatments sharing a slug keep the first occurrence only.
    pub fn new(
        pathologies: Vec<Pathology>,
        treatments: Vec<Treatment>,
        fingerprint: String,
    ) -> Self {
        let mut seen = HashSet::new();
        let treatments: Vec<Treatment> = treatments
            .into_iter()
            .filter(|t| {
                let fresh = seen.insert(t.slug.clone());
                if !fresh {
                    warn!(slug = %t.slug, name = %t.name, "duplicate treatment slug skipped");
                }
                fresh
            })
            .collect();
        let index = build_index(&pathologies, &treatments);
        let scores: HashMap<String, u8> = treatments
            .iter()
            .map(|t| (t.slug.clone(), compute_score(t, &treatments)))
            .collect();

        info!(
            pathologies = pathologies.len(),
            treatments = treatments.len(),
            entries = index.len(),
            "catalog built"
        );

        Self {
            pathologies,
            treatments,
            index,
            scores,
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn pathology_count(&self) -> usize {
        self.pathologies.len()
    }

    pub fn treatment_count(&self) -> usize {
        self.treatments.len()
    }

    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn treatment(&self, slug: &str) -> Option<&Treatment> {
        self.treatments.iter().find(|t| t.slug == slug)
    }

    pub fn pathology(&self, slug: &str) -> Option<&Pathology> {
        self.pathologies.iter().find(|p| p.slug == slug)
    }

    pub fn search(&self, query: &str, limit: usize) -> SearchResponse {
        let ranked = search(&self.index, query, limit);
        let groups = group_by_kind(&ranked)
            .into_iter()
            .map(|group| SearchGroup {
                kind: group.kind,
                items: group.items.iter().map(|r| to_hit(r, query)).collect(),
            })
            .collect();

        SearchResponse {
            query: query.to_string(),
            results: ranked.iter().map(|r| to_hit(r, query)).collect(),
            groups,
        }
    }

    pub fn treatment_detail(&self, slug: &str) -> Option<TreatmentDetailResponse> {
        let treatment = self.treatment(slug)?;
        Some(TreatmentDetailResponse {
            score: score_breakdown(treatment, &self.treatments),
            trials: TrialSummary::from_trials(&treatment.trials),
            treatment: treatment.clone(),
        })
    }

    /// `key` may be a category slug or its label in any accent/case variant.
    pub fn category(&self, key: &str) -> Option<CategoryListResponse> {
        let slug = slugify(key);
        let title = self
            .treatments
            .iter()
            .flat_map(|t| t.categories.iter())
            .find(|c| slugify(c) == slug)?
            .clone();

        let treatments = self
            .treatments
            .iter()
            .filter(|t| t.categories.iter().any(|c| slugify(c) == slug))
            .map(|t| self.summarize(t))
            .collect();

        Some(CategoryListResponse {
            slug,
            title,
            treatments,
        })
    }

    /// Treatments are linked to a pathology through a category whose slug
    /// equals the pathology slug.
    pub fn pathology_detail(&self, slug: &str) -> Option<PathologyDetailResponse> {
        let pathology = self.pathology(slug)?;
        let treatments = self
            .treatments
            .iter()
            .filter(|t| t.categories.iter().any(|c| slugify(c) == pathology.slug))
            .map(|t| self.summarize(t))
            .collect();

        Some(PathologyDetailResponse {
            pathology: pathology.clone(),
            treatments,
        })
    }

    /// Score table. `RankOrder::Score` groups rows by type with the best
    /// score first; `RankOrder::Price` puts the cheapest first and unpriced
    /// rows last. Ties go by name.
    pub fn ranked(
        &self,
        treatment_type: Option<TreatmentType>,
        category: Option<&str>,
        order: RankOrder,
        limit: Option<usize>,
    ) -> Vec<RankedTreatment> {
        let category_slug = category.map(slugify);

        let mut rows: Vec<RankedTreatment> = self
            .treatments
            .iter()
            .filter(|t| treatment_type.is_none_or(|kind| t.treatment_type == kind))
            .filter(|t| {
                category_slug
                    .as_ref()
                    .is_none_or(|slug| t.categories.iter().any(|c| &slugify(c) == slug))
            })
            .map(|t| {
                let trials = TrialSummary::from_trials(&t.trials);
                RankedTreatment {
                    treatment: self.summarize(t),
                    trial_count: trials.trial_count,
                    total_sample_size: trials.total_sample_size,
                }
            })
            .collect();

        match order {
            RankOrder::Score => rows.sort_by(|a, b| {
                type_rank(a.treatment.treatment_type)
                    .cmp(&type_rank(b.treatment.treatment_type))
                    .then_with(|| b.treatment.score.cmp(&a.treatment.score))
                    .then_with(|| a.treatment.name.cmp(&b.treatment.name))
            }),
            RankOrder::Price => rows.sort_by(|a, b| {
                let (pa, pb) = (price_of(a), price_of(b));
                match (pa, pb) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then_with(|| a.treatment.name.cmp(&b.treatment.name))
            }),
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        rows
    }

    fn summarize(&self, treatment: &Treatment) -> TreatmentSummary {
        let score = self
            .scores
            .get(&treatment.slug)
            .copied()
            .unwrap_or_else(|| compute_score(treatment, &self.treatments));
        TreatmentSummary {
            slug: treatment.slug.clone(),
            name: treatment.title().to_string(),
            treatment_type: treatment.treatment_type,
            categories: treatment.categories.clone(),
            brands: treatment.brands.clone(),
            prescription: treatment.prescription.clone(),
            price: treatment.price.clone(),
            refund: treatment.refund.clone(),
            score,
            tier: ScoreTier::from_score(score),
        }
    }
}

fn price_of(row: &RankedTreatment) -> Option<f64> {
    price_value(&row.treatment.price)
}

fn type_rank(kind: TreatmentType) -> usize {
    TreatmentType::ALL
        .iter()
        .position(|t| *t == kind)
        .unwrap_or(TreatmentType::ALL.len())
}

fn to_hit(result: &ScoredEntry, query: &str) -> SearchHit {
    let entry = &result.entry;
    SearchHit {
        kind: entry.kind,
        slug: entry.slug.clone(),
        title: entry.title.clone(),
        subtitle: entry.subtitle.clone(),
        href: entry.href.clone(),
        score: result.score,
        highlight: highlight_title(&entry.title, query),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use neuro_common::model::{EntryKind, Outcome, Trial};

    fn trial(year: i32, n: u32, outcome: i64) -> Trial {
        Trial {
            year: Some(year),
            sample_size: Some(n),
            quality_descriptor: Some("randomisé double-aveugle".to_string()),
            outcome: Outcome::from_score(outcome),
            ..Default::default()
        }
    }

    fn treatment(
        name: &str,
        kind: TreatmentType,
        categories: &[&str],
        brands: &[&str],
        trials: Vec<Trial>,
    ) -> Treatment {
        Treatment {
            slug: slugify(name),
            name: name.to_string(),
            treatment_type: kind,
            categories: categories.iter().map(|s| s.to_string()).collect(),
            brands: brands.iter().map(|s| s.to_string()).collect(),
            trials,
            ..Default::default()
        }
    }

    pub(crate) fn sample_catalog() -> Catalog {
        let pathologies = vec![
            Pathology {
                slug: "migraine-chronique".to_string(),
                name: "Migraine chronique".to_string(),
                description: String::new(),
                category: "Migraine".to_string(),
                super_category: "Céphalées primaires".to_string(),
            },
            Pathology {
                slug: "algie-vasculaire-de-la-face".to_string(),
                name: "Algie vasculaire de la face".to_string(),
                description: String::new(),
                category: "Céphalées trigémino-autonomiques".to_string(),
                super_category: "Céphalées primaires".to_string(),
            },
        ];
        let mut treatments = vec![
            treatment(
                "Topiramate",
                TreatmentType::Maintenance,
                &["Antiépileptiques", "Migraine chronique"],
                &["Epitomax"],
                vec![trial(2004, 300, 1), trial(2007, 300, 1)],
            ),
            treatment(
                "Propranolol",
                TreatmentType::Maintenance,
                &["Bêta-bloquants"],
                &["Avlocardyl"],
                vec![trial(2000, 50, 1), trial(2002, 50, -1)],
            ),
            treatment(
                "Sumatriptan",
                TreatmentType::Abortive,
                &["Triptans"],
                &["Imigrane"],
                vec![trial(1991, 1000, 1)],
            ),
            treatment(
                "Oxygène",
                TreatmentType::Emergency,
                &["Algie vasculaire de la face"],
                &[],
                vec![],
            ),
        ];
        for (t, price) in treatments
            .iter_mut()
            .zip(["15,20\u{a0}€", "Libre", "4,90\u{a0}€", "unknown"])
        {
            t.price = price.to_string();
        }
        Catalog::new(pathologies, treatments, "test".to_string())
    }

    #[test]
    fn search_returns_flat_and_grouped_results() {
        let catalog = sample_catalog();
        let response = catalog.search("migraine", 12);
        assert!(!response.results.is_empty());
        assert_eq!(response.results[0].kind, EntryKind::PathologyCategory);
        let grouped: usize = response.groups.iter().map(|g| g.items.len()).sum();
        assert_eq!(grouped, response.results.len());
        assert!(response.results[0].highlight.iter().any(|s| s.matched));
    }

    #[test]
    fn treatment_detail_includes_breakdown() {
        let catalog = sample_catalog();
        let detail = catalog.treatment_detail("topiramate").expect("topiramate");
        assert_eq!(detail.trials.trial_count, 2);
        assert_eq!(detail.trials.total_sample_size, 600);
        assert_eq!(detail.score.weights.duration, 0.10);
        assert!(catalog.treatment_detail("unknown").is_none());
    }

    #[test]
    fn category_accepts_label_or_slug() {
        let catalog = sample_catalog();
        let by_label = catalog.category("Bêta-bloquants").expect("category");
        let by_slug = catalog.category("beta-bloquants").expect("category");
        assert_eq!(by_label.slug, "beta-bloquants");
        assert_eq!(by_slug.title, "Bêta-bloquants");
        assert_eq!(by_slug.treatments.len(), 1);
        assert_eq!(by_slug.treatments[0].slug, "propranolol");
        assert!(catalog.category("nope").is_none());
    }

    #[test]
    fn pathology_links_treatments_by_category_slug() {
        let catalog = sample_catalog();
        let detail = catalog.pathology_detail("migraine-chronique").expect("pathology");
        let slugs: Vec<&str> = detail.treatments.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["topiramate"]);

        let avf = catalog
            .pathology_detail("algie-vasculaire-de-la-face")
            .expect("pathology");
        assert_eq!(avf.treatments[0].slug, "oxygene");
        assert_eq!(avf.treatments[0].score, 0);
    }

    #[test]
    fn ranking_sorts_by_score_and_filters() {
        let catalog = sample_catalog();
        let all = catalog.ranked(None, None, RankOrder::Score, None);
        let order: Vec<&str> = all.iter().map(|r| r.treatment.slug.as_str()).collect();
        assert_eq!(order, vec!["topiramate", "propranolol", "sumatriptan", "oxygene"]);

        let maintenance =
            catalog.ranked(Some(TreatmentType::Maintenance), None, RankOrder::Score, None);
        let names: Vec<&str> = maintenance.iter().map(|r| r.treatment.name.as_str()).collect();
        assert_eq!(names, vec!["Topiramate", "Propranolol"]);

        let triptans = catalog.ranked(None, Some("triptans"), RankOrder::Score, Some(5));
        assert_eq!(triptans.len(), 1);
        assert_eq!(triptans[0].trial_count, 1);

        assert_eq!(catalog.ranked(None, None, RankOrder::Score, Some(2)).len(), 2);
    }

    #[test]
    fn price_order_puts_unpriced_last() {
        let catalog = sample_catalog();
        let rows = catalog.ranked(None, None, RankOrder::Price, None);
        let order: Vec<&str> = rows.iter().map(|r| r.treatment.slug.as_str()).collect();
        assert_eq!(order, vec!["sumatriptan", "topiramate", "oxygene", "propranolol"]);
        assert_eq!(rows[0].treatment.price, "4,90\u{a0}€");
    }

    #[test]
    fn duplicate_slugs_keep_first_treatment_and_its_score() {
        let first = treatment(
            "Naproxène",
            TreatmentType::Abortive,
            &["AINS"],
            &[],
            vec![trial(2001, 100, 1)],
        );
        let mut second = treatment("Naproxene", TreatmentType::Abortive, &["AINS"], &[], vec![]);
        second.description = "doublon".to_string();
        assert_eq!(first.slug, second.slug);

        let catalog = Catalog::new(Vec::new(), vec![first, second], "dup".to_string());
        assert_eq!(catalog.treatment_count(), 1);
        let kept = catalog.treatment("naproxene").expect("treatment");
        assert_eq!(kept.name, "Naproxène");

        let rows = catalog.ranked(None, None, RankOrder::Score, None);
        assert_eq!(rows.len(), 1);
        let detail = catalog.treatment_detail("naproxene").expect("detail");
        assert_eq!(rows[0].treatment.score, detail.score.score);
        assert!(rows[0].treatment.score > 0);
    }

    #[test]
    fn counts_reflect_inputs() {
        let catalog = sample_catalog();
        assert_eq!(catalog.pathology_count(), 2);
        assert_eq!(catalog.treatment_count(), 4);
        assert!(catalog.entry_count() > 6);
        assert_eq!(catalog.fingerprint(), "test");
    }
}
