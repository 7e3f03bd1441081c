//! Query normalization and synonym routing (spec.md §4.1).
//!
//! Bridges vocabulary differences between a predicted food name and the
//! catalog's own naming, in the same spirit as `recipe_parser`/
//! `recipe_converter`'s free-text handling, but fully deterministic (no LLM
//! call): lowercase, synonym lookup, plural flip, then append `raw`-suffixed
//! fallbacks, deduplicating while preserving first-occurrence order.

use crate::config::JsonTables;

/// An ordered, deduplicated list of search query variants for one name.
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    pub variants: Vec<String>,
}

impl NormalizedQuery {
    pub fn first(&self) -> &str {
        self.variants.first().map(|s| s.as_str()).unwrap_or("")
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn to_key(s: &str) -> String {
    collapse_whitespace(&s.trim().to_lowercase())
}

/// spec.md §4.1 algorithm, steps 1-5.
pub fn normalize(name: &str, tables: &JsonTables) -> NormalizedQuery {
    let base = to_key(name);
    let mut variants = Vec::new();
    push_unique(&mut variants, base.clone());

    if let Some(rewritten) = tables.synonyms.get(&base) {
        push_unique(&mut variants, rewritten.clone());
    }
    let snake_key = base.replace(' ', "_");
    if let Some(rewritten) = tables.synonyms.get(&snake_key) {
        push_unique(&mut variants, rewritten.clone());
    }

    let plural_flip = tables
        .plural_map
        .get(&base)
        .or_else(|| tables.plural_map.get(&snake_key))
        .cloned();
    if let Some(flipped) = &plural_flip {
        push_unique(&mut variants, flipped.clone());
    }

    push_unique(&mut variants, format!("{base} raw"));
    if let Some(flipped) = &plural_flip {
        push_unique(&mut variants, format!("{flipped} raw"));
    }

    NormalizedQuery { variants }
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    if !candidate.trim().is_empty() && !variants.contains(&candidate) {
        variants.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonTables;

    fn tables() -> JsonTables {
        JsonTables::load_defaults().unwrap()
    }

    #[test]
    fn synonym_rewrite_is_first_non_original_variant() {
        let normalized = normalize("cantaloupe", &tables());
        assert_eq!(normalized.variants[0], "cantaloupe");
        assert_eq!(normalized.variants[1], "melons cantaloupe raw");
    }

    #[test]
    fn plural_flip_is_present() {
        let normalized = normalize("grapes", &tables());
        assert!(normalized.variants.contains(&"grape".to_string()));
        assert!(normalized.variants.contains(&"grapes raw".to_string()));
        assert!(normalized.variants.contains(&"grape raw".to_string()));
    }

    #[test]
    fn deduplicates_preserving_first_occurrence() {
        let normalized = normalize("  Grapes  ", &tables());
        let mut seen = std::collections::HashSet::new();
        for v in &normalized.variants {
            assert!(seen.insert(v.clone()), "duplicate variant: {v}");
        }
        assert_eq!(normalized.variants[0], "grapes");
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let tables = tables();
        let first = normalize("grapes", &tables);
        let second = normalize(first.first(), &tables);
        // normalizing the chosen variant again still produces a set containing it first
        assert_eq!(second.variants[0], first.first());
    }

    #[test]
    fn no_synonym_still_yields_raw_fallbacks() {
        let normalized = normalize("chicken breast", &tables());
        assert!(normalized.variants.contains(&"chicken breast raw".to_string()));
    }
}
