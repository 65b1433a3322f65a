/// Text folding shared by the indexer and the ranker.
///
/// Every matching decision goes through these helpers so that an entry and a
/// query are always folded the same way: "Bêta-bloquant", "beta bloquant" and
/// "betabloquant" all meet in the squeezed form.
use unicode_normalization::UnicodeNormalization;

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// NFD-decompose, drop combining diacritics, lowercase.
pub fn normalize(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// `normalize` restricted to ASCII letters and digits.
pub fn squeeze(input: &str) -> String {
    normalize(input)
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Strips an already-normalized token down to its squeezed form.
pub fn squeeze_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

pub fn tokenize(query: &str) -> Vec<String> {
    normalize(query)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// URL slug: folded, punctuation turned into separators, single dashes.
pub fn slugify(input: &str) -> String {
    let replaced: String = normalize(input)
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let dashed = replaced.split_whitespace().collect::<Vec<_>>().join("-");

    let mut slug = String::with_capacity(dashed.len());
    for c in dashed.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Joins the non-empty parts with a single space.
pub(crate) fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
