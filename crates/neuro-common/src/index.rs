//! In-memory search index over pathologies and treatments.
//!
//! Besides one entry per source record, the index derives one entry per
//! pathology category, per treatment category and per commercial brand, so
//! the ranker can surface those pages directly.
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{EntryKind, IndexEntry, Pathology, Treatment};
use crate::text::{join_present, normalize, slugify, squeeze};

pub const PATHOLOGY_WEIGHT: u32 = 4;
pub const PATHOLOGY_CATEGORY_WEIGHT: u32 = 6;
pub const TREATMENT_WEIGHT: u32 = 5;
pub const BRAND_WEIGHT: u32 = 2;
/// Highest static weight so an exact category hit can outrank everything.
pub const CATEGORY_WEIGHT: u32 = 7;

const FALLBACK_PATHOLOGY_CATEGORY: &str = "Autres";

/// First-seen label and member count of a derived category.
struct CategoryAgg {
    title: String,
    count: usize,
}

/// Insertion-ordered aggregation keyed by slug.
#[derive(Default)]
struct CategoryAggregator {
    order: Vec<String>,
    by_slug: HashMap<String, CategoryAgg>,
}

impl CategoryAggregator {
    fn add(&mut self, label: &str) {
        let slug = slugify(label);
        match self.by_slug.get_mut(&slug) {
            Some(agg) => agg.count += 1,
            None => {
                self.order.push(slug.clone());
                self.by_slug.insert(
                    slug,
                    CategoryAgg {
                        title: label.to_string(),
                        count: 1,
                    },
                );
            }
        }
    }

    fn into_entries(self) -> impl Iterator<Item = (String, CategoryAgg)> {
        let CategoryAggregator { order, mut by_slug } = self;
        order.into_iter().filter_map(move |slug| {
            let agg = by_slug.remove(&slug)?;
            Some((slug, agg))
        })
    }
}

/// Keeps the first entry seen for each `(kind, slug)` pair.
#[derive(Default)]
struct IndexBuilder {
    entries: Vec<IndexEntry>,
    seen: HashSet<(EntryKind, String)>,
}

impl IndexBuilder {
    fn push(&mut self, entry: IndexEntry) {
        if self.seen.insert((entry.kind, entry.slug.clone())) {
            self.entries.push(entry);
        } else {
            debug!(kind = ?entry.kind, slug = %entry.slug, "duplicate index slug skipped");
        }
    }
}

/// Builds the full index. Entry order is: pathologies, pathology categories,
/// treatments each followed by their brands, treatment categories.
pub fn build_index(pathologies: &[Pathology], treatments: &[Treatment]) -> Vec<IndexEntry> {
    let mut builder = IndexBuilder::default();

    for p in pathologies {
        builder.push(pathology_entry(p));
    }

    let mut pathology_categories = CategoryAggregator::default();
    for p in pathologies {
        let label = if p.category.is_empty() {
            FALLBACK_PATHOLOGY_CATEGORY
        } else {
            p.category.as_str()
        };
        pathology_categories.add(label);
    }
    for (slug, agg) in pathology_categories.into_entries() {
        builder.push(IndexEntry {
            kind: EntryKind::PathologyCategory,
            normalized_text: normalize(&agg.title),
            squeezed_text: squeeze(&agg.title),
            subtitle: format!("{} pathologie(s)", agg.count),
            weight: PATHOLOGY_CATEGORY_WEIGHT,
            href: format!("/pathologies/category/{slug}"),
            title: agg.title,
            slug,
        });
    }

    let mut treatment_categories = CategoryAggregator::default();
    for t in treatments {
        builder.push(treatment_entry(t));
        for brand in &t.brands {
            builder.push(brand_entry(brand, t));
        }
        for category in &t.categories {
            treatment_categories.add(category);
        }
    }
    for (slug, agg) in treatment_categories.into_entries() {
        builder.push(IndexEntry {
            kind: EntryKind::Category,
            normalized_text: normalize(&agg.title),
            squeezed_text: squeeze(&agg.title),
            subtitle: format!("{} traitement(s)", agg.count),
            weight: CATEGORY_WEIGHT,
            href: format!("/traitements/category/{slug}"),
            title: agg.title,
            slug,
        });
    }

    debug!(
        pathologies = pathologies.len(),
        treatments = treatments.len(),
        entries = builder.entries.len(),
        "search index built"
    );
    builder.entries
}

fn pathology_entry(p: &Pathology) -> IndexEntry {
    let subtitle = if p.category.is_empty() {
        p.super_category.clone()
    } else {
        p.category.clone()
    };
    IndexEntry {
        kind: EntryKind::Pathology,
        slug: p.slug.clone(),
        title: p.name.clone(),
        normalized_text: normalize(&join_present(&[&p.name, &subtitle, &p.description])),
        squeezed_text: squeeze(&join_present(&[&p.name, &subtitle])),
        subtitle,
        weight: PATHOLOGY_WEIGHT,
        href: format!("/pathologies/{}", p.slug),
    }
}

fn treatment_entry(t: &Treatment) -> IndexEntry {
    let title = t.title();
    let categories = t.categories.join(" ");
    let brands = t.brands.join(" ");
    IndexEntry {
        kind: EntryKind::Treatment,
        slug: t.slug.clone(),
        title: title.to_string(),
        subtitle: t.categories.join(" · "),
        normalized_text: normalize(&[title, &t.description, &categories, &brands].join(" ")),
        squeezed_text: squeeze(&[title, &categories, &brands].join(" ")),
        weight: TREATMENT_WEIGHT,
        href: format!("/traitements/{}", t.slug),
    }
}

fn brand_entry(brand: &str, parent: &Treatment) -> IndexEntry {
    let parent_title = parent.title();
    let text = format!("{brand} {parent_title}");
    IndexEntry {
        kind: EntryKind::Brand,
        slug: slugify(brand),
        title: brand.to_string(),
        subtitle: format!("→ {parent_title}"),
        normalized_text: normalize(&text),
        squeezed_text: squeeze(&text),
        weight: BRAND_WEIGHT,
        href: format!("/traitements/{}", parent.slug),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::TreatmentType;

    pub(crate) fn pathology(name: &str, category: &str) -> Pathology {
        Pathology {
            slug: slugify(name),
            name: name.to_string(),
            description: String::new(),
            category: category.to_string(),
            super_category: "Céphalées primaires".to_string(),
        }
    }

    pub(crate) fn treatment(name: &str, categories: &[&str], brands: &[&str]) -> Treatment {
        Treatment {
            slug: slugify(name),
            name: name.to_string(),
            treatment_type: TreatmentType::Abortive,
            categories: categories.iter().map(|s| s.to_string()).collect(),
            brands: brands.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn count_kind(index: &[IndexEntry], kind: EntryKind) -> usize {
        index.iter().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn empty_inputs_give_empty_index() {
        assert!(build_index(&[], &[]).is_empty());
    }

    #[test]
    fn derives_category_and_brand_entries() {
        let pathologies = vec![
            pathology("Migraine sans aura", "Migraine"),
            pathology("Migraine avec aura", "Migraine"),
            pathology("Céphalée de tension épisodique", "Céphalée de tension"),
        ];
        let treatments = vec![
            treatment("Sumatriptan", &["Triptans"], &["Imigrane", "Imiject"]),
            treatment("Zolmitriptan", &["Triptans"], &["Zomig"]),
        ];

        let index = build_index(&pathologies, &treatments);

        assert_eq!(count_kind(&index, EntryKind::Pathology), 3);
        assert_eq!(count_kind(&index, EntryKind::PathologyCategory), 2);
        assert_eq!(count_kind(&index, EntryKind::Treatment), 2);
        assert_eq!(count_kind(&index, EntryKind::Brand), 3);
        assert_eq!(count_kind(&index, EntryKind::Category), 1);

        let migraine = index
            .iter()
            .find(|e| e.kind == EntryKind::PathologyCategory && e.slug == "migraine")
            .expect("migraine category");
        assert_eq!(migraine.subtitle, "2 pathologie(s)");
        assert_eq!(migraine.weight, PATHOLOGY_CATEGORY_WEIGHT);
        assert_eq!(migraine.href, "/pathologies/category/migraine");

        let triptans = index
            .iter()
            .find(|e| e.kind == EntryKind::Category)
            .expect("triptans category");
        assert_eq!(triptans.subtitle, "2 traitement(s)");
        assert_eq!(triptans.weight, CATEGORY_WEIGHT);

        let zomig = index.iter().find(|e| e.slug == "zomig").expect("brand");
        assert_eq!(zomig.subtitle, "→ Zolmitriptan");
        assert_eq!(zomig.href, "/traitements/zolmitriptan");
        assert_eq!(zomig.normalized_text, "zomig zolmitriptan");
    }

    #[test]
    fn entry_order_follows_source_order() {
        let index = build_index(
            &[pathology("Migraine chronique", "Migraine")],
            &[treatment("Topiramate", &["Antiépileptiques"], &["Epitomax"])],
        );
        let kinds: Vec<EntryKind> = index.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Pathology,
                EntryKind::PathologyCategory,
                EntryKind::Treatment,
                EntryKind::Brand,
                EntryKind::Category,
            ]
        );
    }

    #[test]
    fn category_variants_collapse_on_slug() {
        let treatments = vec![
            treatment("Propranolol", &["Bêta-bloquants"], &[]),
            treatment("Métoprolol", &["beta bloquants"], &[]),
            treatment("Flunarizine", &["Inhibiteurs calciques"], &[]),
        ];
        let index = build_index(&[], &treatments);
        let categories: Vec<&IndexEntry> =
            index.iter().filter(|e| e.kind == EntryKind::Category).collect();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].slug, "beta-bloquants");
        assert_eq!(categories[0].title, "Bêta-bloquants");
        assert_eq!(categories[0].subtitle, "2 traitement(s)");
    }

    #[test]
    fn slugs_are_unique_within_kind() {
        let treatments = vec![
            treatment("Ibuprofène", &["AINS"], &["Advil"]),
            treatment("Ibuprofène arginine", &["AINS"], &["Advil"]),
        ];
        let index = build_index(&[], &treatments);
        let advil: Vec<&IndexEntry> = index.iter().filter(|e| e.slug == "advil").collect();
        assert_eq!(advil.len(), 1);
        assert_eq!(advil[0].subtitle, "→ Ibuprofène");

        let mut seen = HashSet::new();
        for e in &index {
            assert!(seen.insert((e.kind, e.slug.clone())), "duplicate {:?}/{}", e.kind, e.slug);
        }
    }

    #[test]
    fn pathology_texts_and_fallback_category() {
        let mut p = pathology("Algie vasculaire de la face", "");
        p.description = "Douleur orbitaire unilatérale".to_string();
        let index = build_index(&[p], &[]);

        let entry = &index[0];
        assert_eq!(entry.subtitle, "Céphalées primaires");
        assert_eq!(
            entry.normalized_text,
            "algie vasculaire de la face cephalees primaires douleur orbitaire unilaterale"
        );
        assert_eq!(entry.squeezed_text, "algievasculairedelafacecephaleesprimaires");

        let category = &index[1];
        assert_eq!(category.kind, EntryKind::PathologyCategory);
        assert_eq!(category.title, "Autres");
        assert_eq!(category.slug, "autres");
    }

    #[test]
    fn treatment_without_name_uses_slug_as_title() {
        let mut t = treatment("", &[], &[]);
        t.slug = "molecule-x".to_string();
        let index = build_index(&[], &[t]);
        assert_eq!(index[0].title, "molecule-x");
    }
}
