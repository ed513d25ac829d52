//! Close-match suggestions for mistyped dataset ids.
//!
//! Similarity is a character-bigram Dice coefficient, good enough to
//! rank "did you mean" candidates without a stemming dictionary. When
//! the broken id already names a publisher/namespace pair that exists,
//! matching is scoped to that prefix with a looser cutoff.

use std::collections::HashSet;

const SCOPED_CUTOFF: f64 = 0.5;
const GLOBAL_CUTOFF: f64 = 0.7;
const MAX_SUGGESTIONS: usize = 3;

pub(crate) fn suggest_ids(target: &str, all_ids: &[String]) -> Vec<String> {
    if all_ids.is_empty() {
        return Vec::new();
    }

    let parts: Vec<&str> = target.split('/').collect();
    if parts.len() == 3 {
        let prefix = format!("{}/{}/", parts[0], parts[1]);
        let scoped: Vec<String> = all_ids
            .iter()
            .filter(|id| id.starts_with(&prefix))
            .cloned()
            .collect();
        if !scoped.is_empty() {
            return close_matches(target, &scoped, SCOPED_CUTOFF);
        }
    }

    close_matches(target, all_ids, GLOBAL_CUTOFF)
}

fn close_matches(target: &str, candidates: &[String], cutoff: f64) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = candidates
        .iter()
        .map(|c| (similarity(target, c), c))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, c)| c.clone())
        .collect()
}

fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a_grams = bigrams(a);
    let b_grams = bigrams(b);
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }
    let overlap = a_grams.intersection(&b_grams).count();
    (2.0 * overlap as f64) / (a_grams.len() + b_grams.len()) as f64
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}
