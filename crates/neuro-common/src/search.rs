//! Additive keyword ranking over the search index.
//!
//! Each entry is scored against every query token on both its normalized and
//! squeezed text. All tokens must match; bonuses then reward text-start,
//! title-prefix, exact-title and whole-phrase hits before the entry's static
//! weight is added.
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{EntryKind, IndexEntry};
use crate::text::{normalize, squeeze, squeeze_token, tokenize};

const TOKEN_PRESENCE_BONUS: u32 = 1;
const TEXT_START_BONUS: u32 = 1;
const TITLE_PREFIX_BONUS: u32 = 2;
const PHRASE_BONUS: u32 = 8;
const SQUEEZED_PHRASE_BONUS: u32 = 12;

/// Bonus for a title equal to the query. Category pages get the larger value
/// so they sit above the items they contain.
fn exact_title_bonus(kind: EntryKind) -> u32 {
    match kind {
        EntryKind::PathologyCategory | EntryKind::Category => 1200,
        EntryKind::Pathology | EntryKind::Treatment | EntryKind::Brand => 400,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredEntry {
    pub entry: IndexEntry,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResultGroup {
    pub kind: EntryKind,
    pub items: Vec<ScoredEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TitleSegment {
    pub text: String,
    pub matched: bool,
}

/// Scores one entry. `tokens` must come from `text::tokenize(raw_query)`.
/// Returns 0 when any token is missing from both text forms.
pub fn score_entry(entry: &IndexEntry, tokens: &[String], raw_query: &str) -> u32 {
    if tokens.is_empty() {
        return 0;
    }

    let title_norm = normalize(&entry.title);
    let title_sq = squeeze(&entry.title);
    let mut score = 0;

    for token in tokens {
        let token_sq = squeeze_token(token);
        let pos = entry.normalized_text.find(token.as_str());
        let pos_sq = entry.squeezed_text.find(token_sq.as_str());

        if pos.is_none() && pos_sq.is_none() {
            return 0;
        }

        score += TOKEN_PRESENCE_BONUS;

        if pos == Some(0) || pos_sq == Some(0) {
            score += TEXT_START_BONUS;
        }

        if !entry.title.is_empty()
            && (title_norm.starts_with(token.as_str()) || title_sq.starts_with(token_sq.as_str()))
        {
            score += TITLE_PREFIX_BONUS;
        }
    }

    let query_norm = normalize(raw_query);
    let query_sq = squeeze(raw_query);

    if title_norm == query_norm {
        score += exact_title_bonus(entry.kind);
    }
    if title_sq == query_sq {
        score += exact_title_bonus(entry.kind);
    }

    if !query_norm.is_empty() && entry.normalized_text.contains(&query_norm) {
        score += PHRASE_BONUS;
    }
    if !query_sq.is_empty() && entry.squeezed_text.contains(&query_sq) {
        score += SQUEEZED_PHRASE_BONUS;
    }

    score + entry.weight
}

/// Ranks `index` against `query`, best first, at most `limit` entries.
/// Ties keep index order. A blank query returns nothing.
pub fn search(index: &[IndexEntry], query: &str, limit: usize) -> Vec<ScoredEntry> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let tokens = tokenize(query);

    let mut scored: Vec<ScoredEntry> = index
        .iter()
        .filter_map(|entry| {
            let score = score_entry(entry, &tokens, query);
            (score > 0).then(|| ScoredEntry {
                entry: entry.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);

    debug!(query, results = scored.len(), "search ranked");
    scored
}

/// Buckets ranked results by kind in display order, dropping empty buckets.
/// Rank order is preserved inside each bucket.
pub fn group_by_kind(results: &[ScoredEntry]) -> Vec<ResultGroup> {
    EntryKind::DISPLAY_ORDER
        .iter()
        .filter_map(|&kind| {
            let items: Vec<ScoredEntry> = results
                .iter()
                .filter(|r| r.entry.kind == kind)
                .cloned()
                .collect();
            (!items.is_empty()).then_some(ResultGroup { kind, items })
        })
        .collect()
}

/// Splits `title` around case-insensitive occurrences of the query tokens.
pub fn highlight_title(title: &str, query: &str) -> Vec<TitleSegment> {
    let whole = || {
        vec![TitleSegment {
            text: title.to_string(),
            matched: false,
        }]
    };

    let tokens = tokenize(query);
    if tokens.is_empty() {
        return whole();
    }

    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(pattern) = Regex::new(&format!("(?i)(?:{alternation})")) else {
        return whole();
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for m in pattern.find_iter(title) {
        if m.start() > last {
            segments.push(TitleSegment {
                text: title[last..m.start()].to_string(),
                matched: false,
            });
        }
        segments.push(TitleSegment {
            text: m.as_str().to_string(),
            matched: true,
        });
        last = m.end();
    }
    if last < title.len() {
        segments.push(TitleSegment {
            text: title[last..].to_string(),
            matched: false,
        });
    }

    if segments.is_empty() {
        return whole();
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::index::tests::{pathology, treatment};

    fn entry(kind: EntryKind, title: &str, weight: u32) -> IndexEntry {
        IndexEntry {
            kind,
            slug: crate::text::slugify(title),
            title: title.to_string(),
            subtitle: String::new(),
            normalized_text: normalize(title),
            squeezed_text: squeeze(title),
            weight,
            href: String::new(),
        }
    }

    fn sample_index() -> Vec<IndexEntry> {
        build_index(
            &[
                pathology("Migraine chronique", "Migraine"),
                pathology("Migraine avec aura", "Migraine"),
                pathology("Céphalée de tension épisodique", "Céphalée de tension"),
            ],
            &[
                treatment("Propranolol", &["Bêta-bloquants"], &["Avlocardyl"]),
                treatment("Sumatriptan", &["Triptans"], &["Imigrane"]),
            ],
        )
    }

    #[test]
    fn blank_query_returns_nothing() {
        let index = sample_index();
        assert!(search(&index, "", 12).is_empty());
        assert!(search(&index, "   ", 12).is_empty());
    }

    #[test]
    fn unmatched_query_returns_nothing() {
        assert!(search(&sample_index(), "xyzzy", 12).is_empty());
    }

    #[test]
    fn every_token_must_match() {
        let results = search(&sample_index(), "migraine aura", 12);
        assert!(!results.is_empty());
        for r in &results {
            for token in ["migraine", "aura"] {
                assert!(
                    r.entry.normalized_text.contains(token)
                        || r.entry.squeezed_text.contains(token),
                    "{} lacks {token}",
                    r.entry.title
                );
            }
        }
        assert_eq!(results[0].entry.title, "Migraine avec aura");
    }

    #[test]
    fn results_contain_query_and_exact_title_gets_bonus() {
        let index = sample_index();
        let results = search(&index, "migraine", 12);
        assert!(results
            .iter()
            .all(|r| r.entry.normalized_text.contains("migraine")
                || r.entry.squeezed_text.contains("migraine")));

        // The "Migraine" pathology category equals the query on both forms.
        let top = &results[0];
        assert_eq!(top.entry.kind, EntryKind::PathologyCategory);
        assert_eq!(top.entry.title, "Migraine");
        assert!(top.score >= 2400);

        let chronic = search(&index, "Migraine chronique", 12);
        let hit = chronic
            .iter()
            .find(|r| r.entry.title == "Migraine chronique")
            .expect("chronic migraine");
        assert!(hit.score >= 800);
    }

    #[test]
    fn exact_title_bonus_table() {
        let tokens = tokenize("aura");
        let pathology = entry(EntryKind::Pathology, "Aura", 0);
        let category = entry(EntryKind::PathologyCategory, "Aura", 0);
        // presence 1 + start 1 + title prefix 2 + phrase 8 + squeezed phrase 12 = 24
        assert_eq!(score_entry(&pathology, &tokens, "aura"), 24 + 800);
        assert_eq!(score_entry(&category, &tokens, "aura"), 24 + 2400);
    }

    #[test]
    fn squeezed_title_match_earns_a_single_bonus() {
        let tokens = tokenize("beta bloquants");
        let category = entry(EntryKind::Category, "Bêta-bloquants", 0);
        let treatment = entry(EntryKind::Treatment, "Bêta-bloquants", 0);
        // "beta": presence 1 + start 1 + title prefix 2; "bloquants": presence 1;
        // squeezed phrase 12; normalized titles differ so only one exact bonus
        assert_eq!(score_entry(&category, &tokens, "beta bloquants"), 17 + 1200);
        assert_eq!(score_entry(&treatment, &tokens, "beta bloquants"), 17 + 400);
    }

    #[test]
    fn bonus_breakdown_for_partial_match() {
        let e = entry(EntryKind::Treatment, "Acide acétylsalicylique", 5);
        let tokens = tokenize("salicylique");
        // presence 1, no start, no prefix, phrase 8, squeezed phrase 12, weight 5
        assert_eq!(score_entry(&e, &tokens, "salicylique"), 26);
    }

    #[test]
    fn squeezed_form_matches_accent_and_hyphen_variants() {
        let index = sample_index();
        for query in ["betabloquants", "bêta-bloquants", "beta bloquants"] {
            let results = search(&index, query, 12);
            assert!(
                results.iter().any(|r| r.entry.kind == EntryKind::Category
                    && r.entry.slug == "beta-bloquants"),
                "query {query:?} should reach the category"
            );
        }
        let results = search(&index, "betabloquants", 12);
        assert_eq!(results[0].entry.kind, EntryKind::Category);
    }

    #[test]
    fn ties_keep_index_order_and_limit_applies() {
        let index = vec![
            entry(EntryKind::Treatment, "Alpha test", 1),
            entry(EntryKind::Treatment, "Beta test", 1),
            entry(EntryKind::Treatment, "Gamma test", 1),
        ];
        let results = search(&index, "test", 2);
        let titles: Vec<&str> = results.iter().map(|r| r.entry.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha test", "Beta test"]);
    }

    #[test]
    fn search_is_idempotent() {
        let index = sample_index();
        assert_eq!(search(&index, "migraine", 12), search(&index, "migraine", 12));
    }

    #[test]
    fn grouping_uses_display_order() {
        let index = sample_index();
        let results = search(&index, "a", 50);
        let groups = group_by_kind(&results);
        let order: Vec<EntryKind> = groups.iter().map(|g| g.kind).collect();
        let expected: Vec<EntryKind> = EntryKind::DISPLAY_ORDER
            .into_iter()
            .filter(|k| order.contains(k))
            .collect();
        assert_eq!(order, expected);
        assert!(groups.iter().all(|g| !g.items.is_empty()));
        let total: usize = groups.iter().map(|g| g.items.len()).sum();
        assert_eq!(total, results.len());
    }

    #[test]
    fn highlight_marks_token_occurrences() {
        let segments = highlight_title("Migraine avec aura", "AURA migraine");
        let marked: Vec<(&str, bool)> =
            segments.iter().map(|s| (s.text.as_str(), s.matched)).collect();
        assert_eq!(
            marked,
            vec![("Migraine", true), (" avec ", false), ("aura", true)]
        );
    }

    #[test]
    fn highlight_blank_query_returns_whole_title() {
        let segments = highlight_title("Topiramate", " ");
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].matched);
    }
}
