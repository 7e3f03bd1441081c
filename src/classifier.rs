//! Candidate classifier and hard-reject filter chain (spec.md §4.2).
//!
//! Grounded on `nutritional_matcher`'s scoring-then-filtering shape, but
//! restructured as a candidate filter chain (spec.md §9 design note): one
//! predicate per rejection reason, short-circuiting, each owning its own
//! counter.

use std::collections::HashSet;

use crate::config::{EnergyBands, JsonTables};
use crate::model::{CatalogEntry, EntryForm, Form, Source};
use crate::telemetry::GateCounters;

#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub raw_foundation: Vec<CatalogEntry>,
    pub cooked_foundation_sr: Vec<CatalogEntry>,
    pub branded: Vec<CatalogEntry>,
}

impl Partition {
    pub fn total(&self) -> usize {
        self.raw_foundation.len() + self.cooked_foundation_sr.len() + self.branded.len()
    }
}

fn tokenize(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

const RAW_PROCESSED_MARKERS: &[&str] = &["canned", "can", "pickled", "seasoned", "breaded"];

/// Runs the full §4.2 hard-reject chain for one candidate, short-circuiting
/// on the first rejection. Returns `true` if the candidate survives.
fn survives_hard_rejects(
    entry: &CatalogEntry,
    core_class: &str,
    predicted_form: Option<Form>,
    color_species_token: Option<&str>,
    tables: &JsonTables,
    energy_bands: &EnergyBands,
    use_color_tokens_for_produce: bool,
    counters: &mut GateCounters,
) -> bool {
    let tokens = tokenize(&entry.name);

    if let Some(disallowed) = tables.disallowed_aliases.get(core_class) {
        if disallowed.iter().any(|bad| tokens.contains(bad)) {
            counters.negative_vocab_blocks += 1;
            return false;
        }
    }

    if let Some(&threshold) = tables.sodium_gate_thresholds.get(core_class) {
        match entry.sodium_mg_100g {
            Some(sodium) if sodium >= threshold => counters.sodium_gate_passes += 1,
            _ => {
                counters.sodium_gate_blocks += 1;
                return false;
            }
        }
    }

    if use_color_tokens_for_produce {
        if let Some(dimension) = tables.color_species_dimensions.get(core_class) {
            if let Some(predicted_value) = color_species_token {
                let entry_value = dimension.values.iter().find(|v| tokens.contains(v.as_str()));
                if let Some(entry_value) = entry_value {
                    if entry_value != predicted_value {
                        return false;
                    }
                }
            }
        }
    }

    if predicted_form == Some(Form::Raw) {
        if RAW_PROCESSED_MARKERS.iter().any(|marker| tokens.contains(*marker)) {
            return false;
        }
    }

    if let Some(band) = energy_bands.generic(core_class) {
        if !band.accepts_with_tolerance(entry.kcal_100g, 1.2) {
            return false;
        }
    }

    true
}

/// Partitions a raw candidate list and applies the hard-reject chain,
/// returning the surviving partition plus updated gate counters.
pub fn classify(
    candidates: Vec<CatalogEntry>,
    core_class: &str,
    predicted_form: Option<Form>,
    color_species_token: Option<&str>,
    tables: &JsonTables,
    energy_bands: &EnergyBands,
    use_color_tokens_for_produce: bool,
    counters: &mut GateCounters,
) -> Partition {
    let mut partition = Partition::default();

    for entry in candidates {
        if !survives_hard_rejects(
            &entry,
            core_class,
            predicted_form,
            color_species_token,
            tables,
            energy_bands,
            use_color_tokens_for_produce,
            counters,
        ) {
            continue;
        }

        match (entry.source, &entry.form) {
            (Source::Foundation | Source::SrLegacy, EntryForm::Raw) => partition.raw_foundation.push(entry),
            (Source::Foundation | Source::SrLegacy, _) => partition.cooked_foundation_sr.push(entry),
            (Source::Branded, _) => partition.branded.push(entry),
            (Source::StagezProxy, _) => {}
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;

    fn entry(fdc_id: u64, name: &str, source: Source, form: EntryForm) -> CatalogEntry {
        CatalogEntry {
            fdc_id,
            name: name.to_string(),
            source,
            form,
            kcal_100g: 100.0,
            protein_100g: Some(10.0),
            carbs_100g: Some(5.0),
            fat_100g: Some(2.0),
            sodium_mg_100g: None,
            sugar_g_100g: None,
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn partitions_by_source_and_form() {
        let store = ConfigStore::load_defaults().unwrap();
        let tables = &store.tables;
        let energy_bands = &store.energy_bands;
        let mut counters = GateCounters::default();
        let candidates = vec![
            entry(1, "Chicken, breast, raw", Source::Foundation, EntryForm::Raw),
            entry(2, "Chicken, breast, cooked, grilled", Source::Foundation, EntryForm::Cooked("grilled".into())),
            entry(3, "Chicken nuggets, frozen", Source::Branded, EntryForm::Raw),
        ];
        let partition = classify(candidates, "chicken_breast", Some(Form::Raw), None, tables, energy_bands, true, &mut counters);
        assert_eq!(partition.raw_foundation.len(), 1);
        assert_eq!(partition.cooked_foundation_sr.len(), 1);
        assert_eq!(partition.branded.len(), 1);
    }

    #[test]
    fn disallowed_alias_rejects_yolk_for_egg_white() {
        let store = ConfigStore::load_defaults().unwrap();
        let tables = &store.tables;
        let energy_bands = &store.energy_bands;
        let mut counters = GateCounters::default();
        let candidates = vec![
            entry(1, "Egg, yolk, raw", Source::Foundation, EntryForm::Raw),
            entry(2, "Egg, white, raw", Source::Foundation, EntryForm::Raw),
        ];
        let partition = classify(candidates, "egg_white", Some(Form::Raw), None, tables, energy_bands, true, &mut counters);
        assert_eq!(partition.raw_foundation.len(), 1);
        assert_eq!(partition.raw_foundation[0].fdc_id, 2);
        assert_eq!(counters.negative_vocab_blocks, 1);
    }

    #[test]
    fn sodium_gate_rejects_low_sodium_pickles() {
        let store = ConfigStore::load_defaults().unwrap();
        let tables = &store.tables;
        let energy_bands = &store.energy_bands;
        let mut counters = GateCounters::default();
        let mut low_sodium = entry(1, "Pickles, cucumber, fresh pack", Source::Branded, EntryForm::Raw);
        low_sodium.sodium_mg_100g = Some(200.0);
        let mut high_sodium = entry(2, "Pickles, dill", Source::Branded, EntryForm::Raw);
        high_sodium.sodium_mg_100g = Some(800.0);
        let partition = classify(
            vec![low_sodium, high_sodium],
            "pickles",
            None,
            None,
            tables,
            energy_bands,
            true,
            &mut counters,
        );
        assert_eq!(partition.branded.len(), 1);
        assert_eq!(partition.branded[0].fdc_id, 2);
        assert_eq!(counters.sodium_gate_blocks, 1);
        assert_eq!(counters.sodium_gate_passes, 1);
    }

    #[test]
    fn raw_form_rejects_canned_entries() {
        let store = ConfigStore::load_defaults().unwrap();
        let tables = &store.tables;
        let energy_bands = &store.energy_bands;
        let mut counters = GateCounters::default();
        let candidates = vec![
            entry(1, "Corn, canned, whole kernel", Source::Foundation, EntryForm::Raw),
            entry(2, "Corn, sweet, yellow, raw", Source::Foundation, EntryForm::Raw),
        ];
        let partition = classify(candidates, "corn", Some(Form::Raw), None, tables, energy_bands, true, &mut counters);
        assert_eq!(partition.raw_foundation.len(), 1);
        assert_eq!(partition.raw_foundation[0].fdc_id, 2);
    }

    #[test]
    fn color_mismatch_rejects_different_dimension_value() {
        let store = ConfigStore::load_defaults().unwrap();
        let tables = &store.tables;
        let energy_bands = &store.energy_bands;
        let mut counters = GateCounters::default();
        let candidates = vec![
            entry(1, "Peppers, sweet, red, raw", Source::Foundation, EntryForm::Raw),
            entry(2, "Peppers, sweet, green, raw", Source::Foundation, EntryForm::Raw),
        ];
        let partition = classify(candidates, "bell_pepper_green", Some(Form::Raw), Some("green"), tables, energy_bands, true, &mut counters);
        assert_eq!(partition.raw_foundation.len(), 1);
        assert_eq!(partition.raw_foundation[0].fdc_id, 2);
    }

    #[test]
    fn color_gate_disabled_keeps_both_dimension_values() {
        let store = ConfigStore::load_defaults().unwrap();
        let tables = &store.tables;
        let energy_bands = &store.energy_bands;
        let mut counters = GateCounters::default();
        let candidates = vec![
            entry(1, "Peppers, sweet, red, raw", Source::Foundation, EntryForm::Raw),
            entry(2, "Peppers, sweet, green, raw", Source::Foundation, EntryForm::Raw),
        ];
        let partition = classify(candidates, "bell_pepper_green", Some(Form::Raw), Some("green"), tables, energy_bands, false, &mut counters);
        assert_eq!(partition.raw_foundation.len(), 2);
    }
}
