//! The JSON-shaped config tables (spec.md §9: "synonyms, disallowed aliases,
//! plausibility bands, Stage-5 whitelist, Stage-Z categories, mass rails,
//! and conversion profiles are data"). Loaded once and treated read-only,
//! the same way a nutrient CSV gets loaded once at startup and handed
//! around as a shared, immutable table.
//!
//! Defaults are embedded with `include_str!` so the engine runs without an
//! external file; `JsonTables::load` accepts an override path for callers
//! that ship their own catalog-specific tuning.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{ConversionProfile, CoreClass, EnergyBand};

const DEFAULT_TABLES_JSON: &str = include_str!("data/tables.json");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorSpeciesDimension {
    pub dimension: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonTables {
    pub class_aliases: HashMap<String, CoreClass>,
    pub synonyms: HashMap<String, String>,
    #[serde(default)]
    pub class_token_expansions: HashMap<CoreClass, Vec<String>>,
    #[serde(default)]
    pub product_noun_tokens: Vec<String>,
    #[serde(default)]
    pub stagez_category_bands: HashMap<String, EnergyBand>,
    pub plural_map: HashMap<String, String>,
    pub disallowed_aliases: HashMap<CoreClass, Vec<String>>,
    pub sodium_gate_thresholds: HashMap<CoreClass, f64>,
    pub color_species_dimensions: HashMap<CoreClass, ColorSpeciesDimension>,
    pub method_aliases: HashMap<String, String>,
    pub method_compatibility_groups: Vec<Vec<String>>,
    #[serde(default)]
    pub form_method_overrides: HashMap<CoreClass, HashMap<String, String>>,
    pub class_method_defaults: HashMap<CoreClass, String>,
    pub category_defaults: HashMap<String, String>,
    pub category_membership: HashMap<CoreClass, String>,
    pub stage5_whitelist_classes: Vec<CoreClass>,
    pub stage5_whitelist_keywords: Vec<String>,
    pub stage1b_tolerant_classes: Vec<CoreClass>,
    pub conversion_profiles: HashMap<CoreClass, HashMap<String, ConversionProfile>>,
}

impl JsonTables {
    pub fn load_defaults() -> Result<Self> {
        serde_json::from_str(DEFAULT_TABLES_JSON)
            .with_context(|| "Failed to parse embedded default config tables")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config tables from {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config tables from {:?}", path))
    }

    pub fn method_compatibility_group(&self, method: &str) -> Option<&Vec<String>> {
        self.method_compatibility_groups
            .iter()
            .find(|group| group.iter().any(|m| m == method))
    }

    pub fn methods_compatible(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match self.method_compatibility_group(a) {
            Some(group) => group.iter().any(|m| m == b),
            None => false,
        }
    }

    pub fn resolve_method_alias(&self, form: &str) -> Option<&str> {
        self.method_aliases.get(form).map(|s| s.as_str())
    }

    pub fn form_method_override(&self, core_class: &str, form: &str) -> Option<&str> {
        self.form_method_overrides.get(core_class)?.get(form).map(|s| s.as_str())
    }

    pub fn category_of(&self, core_class: &str) -> Option<&str> {
        self.category_membership.get(core_class).map(|s| s.as_str())
    }

    pub fn is_stage5_whitelisted(&self, core_class: &str) -> bool {
        self.stage5_whitelist_classes.iter().any(|c| c == core_class)
    }

    pub fn is_stage1b_tolerant(&self, core_class: &str) -> bool {
        self.stage1b_tolerant_classes.iter().any(|c| c == core_class)
    }

    pub fn conversion_profile(&self, core_class: &str, method: &str) -> Option<&ConversionProfile> {
        self.conversion_profiles.get(core_class)?.get(method)
    }

    pub fn is_product_noun(&self, token: &str) -> bool {
        self.product_noun_tokens.iter().any(|t| t == token)
    }

    pub fn stagez_category_band(&self, category: &str) -> Option<EnergyBand> {
        self.stagez_category_bands.get(category).copied()
    }
}
