//! Shared scoring primitives used across stages (spec.md §4.4 "Scoring
//! detail"): token overlap, Jaccard, and energy similarity.

use std::collections::HashSet;

use crate::config::JsonTables;
use crate::model::{CatalogEntry, Source};

pub fn tokenize(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Expands a core class into its name tokens plus any synonym expansion
/// (spec.md §4.4: "bell_pepper expands to {bell, pepper, capsicum, sweet}").
pub fn class_tokens(core_class: &str, tables: &JsonTables) -> HashSet<String> {
    let mut tokens: HashSet<String> = core_class.split('_').map(|t| t.to_string()).collect();
    if let Some(extra) = tables.class_token_expansions.get(core_class) {
        tokens.extend(extra.iter().cloned());
    }
    tokens
}

pub fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// `energy_sim = max(0, 1 - min(1, |Δkcal| / 60))` (spec.md §4.4, 60 kcal bandwidth).
pub fn energy_sim(predicted_kcal: f64, entry_kcal: f64) -> f64 {
    let delta = (predicted_kcal - entry_kcal).abs();
    (1.0 - (delta / 60.0).min(1.0)).max(0.0)
}

fn source_priority(source: Source) -> u8 {
    match source {
        Source::Foundation => 2,
        Source::SrLegacy => 1,
        Source::Branded | Source::StagezProxy => 0,
    }
}

/// Decides whether `candidate` should replace `best` at the current best score,
/// per spec.md §4.4's tie-break rule: (1) higher source priority (foundation >
/// sr_legacy > branded), (2) closer energy to the predicted anchor, (3) lower
/// `fdc_id`.
pub fn beats(
    candidate_score: f64,
    candidate: &CatalogEntry,
    best_score: f64,
    best: &CatalogEntry,
    predicted_energy_anchor: Option<f64>,
) -> bool {
    if candidate_score != best_score {
        return candidate_score > best_score;
    }

    let candidate_priority = source_priority(candidate.source);
    let best_priority = source_priority(best.source);
    if candidate_priority != best_priority {
        return candidate_priority > best_priority;
    }

    if let Some(anchor) = predicted_energy_anchor {
        let candidate_delta = (candidate.kcal_100g - anchor).abs();
        let best_delta = (best.kcal_100g - anchor).abs();
        if candidate_delta != best_delta {
            return candidate_delta < best_delta;
        }
    }

    candidate.fdc_id < best.fdc_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_identical_sets_is_one() {
        let a = tokenize("chicken breast raw");
        assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn class_tokens_applies_configured_expansion() {
        let tables = crate::config::ConfigStore::load_defaults().unwrap().tables;
        let tokens = class_tokens("bell_pepper_green", &tables);
        assert!(tokens.contains("bell"));
        assert!(tokens.contains("pepper"));
        assert!(tokens.contains("capsicum"));
        assert!(tokens.contains("sweet"));
    }

    #[test]
    fn class_tokens_without_expansion_is_just_the_split() {
        let tables = crate::config::ConfigStore::load_defaults().unwrap().tables;
        let tokens = class_tokens("chicken_breast", &tables);
        assert_eq!(tokens, HashSet::from(["chicken".to_string(), "breast".to_string()]));
    }

    #[test]
    fn energy_sim_bounds_to_unit_interval() {
        assert_eq!(energy_sim(100.0, 100.0), 1.0);
        assert_eq!(energy_sim(100.0, 200.0), 0.0);
        assert!((energy_sim(100.0, 130.0) - 0.5).abs() < 1e-9);
    }

    fn entry(fdc_id: u64, source: Source, kcal: f64) -> CatalogEntry {
        CatalogEntry {
            fdc_id,
            name: "test entry".to_string(),
            source,
            form: crate::model::EntryForm::Raw,
            kcal_100g: kcal,
            protein_100g: None,
            carbs_100g: None,
            fat_100g: None,
            sodium_mg_100g: None,
            sugar_g_100g: None,
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn beats_prefers_higher_score_first() {
        let candidate = entry(2, Source::Branded, 100.0);
        let best = entry(1, Source::Foundation, 100.0);
        assert!(beats(2.0, &candidate, 1.0, &best, None));
    }

    #[test]
    fn beats_breaks_score_tie_on_source_priority() {
        let candidate = entry(2, Source::SrLegacy, 100.0);
        let best = entry(1, Source::Branded, 100.0);
        assert!(beats(1.0, &candidate, 1.0, &best, None));

        let candidate = entry(2, Source::Branded, 100.0);
        let best = entry(1, Source::Foundation, 100.0);
        assert!(!beats(1.0, &candidate, 1.0, &best, None));
    }

    #[test]
    fn beats_breaks_source_tie_on_closer_energy() {
        let candidate = entry(2, Source::Foundation, 110.0);
        let best = entry(1, Source::Foundation, 150.0);
        assert!(beats(1.0, &candidate, 1.0, &best, Some(100.0)));
    }

    #[test]
    fn beats_breaks_final_tie_on_lower_fdc_id() {
        let candidate = entry(1, Source::Foundation, 100.0);
        let best = entry(2, Source::Foundation, 100.0);
        assert!(beats(1.0, &candidate, 1.0, &best, Some(100.0)));
        assert!(!beats(1.0, &best, 1.0, &candidate, Some(100.0)));
    }
}
