//! Core data model shared by every stage of the alignment engine (spec.md §3).
//!
//! Field shapes follow the same pattern as `recipe_converter`'s
//! `CleanedIngredient`/`CiqualFoodItem`/`CalculatedNutritionalInfo` — plain
//! serde structs, no builder boilerplate, `Option<f64>` for nutrients that a
//! catalog entry may not carry.

use serde::{Deserialize, Serialize};

/// Cooking forms a vision prediction may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
    Raw,
    Boiled,
    Steamed,
    PanSeared,
    Grilled,
    Roasted,
    Fried,
    Baked,
    Breaded,
    Poached,
    Stewed,
    Simmered,
}

impl Form {
    pub fn as_str(&self) -> &'static str {
        match self {
            Form::Raw => "raw",
            Form::Boiled => "boiled",
            Form::Steamed => "steamed",
            Form::PanSeared => "pan_seared",
            Form::Grilled => "grilled",
            Form::Roasted => "roasted",
            Form::Fried => "fried",
            Form::Baked => "baked",
            Form::Breaded => "breaded",
            Form::Poached => "poached",
            Form::Stewed => "stewed",
            Form::Simmered => "simmered",
        }
    }

    pub fn parse(s: &str) -> Option<Form> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Some(Form::Raw),
            "boiled" => Some(Form::Boiled),
            "steamed" => Some(Form::Steamed),
            "pan_seared" | "pan-seared" | "panseared" => Some(Form::PanSeared),
            "grilled" => Some(Form::Grilled),
            "roasted" => Some(Form::Roasted),
            "fried" => Some(Form::Fried),
            "baked" => Some(Form::Baked),
            "breaded" => Some(Form::Breaded),
            "poached" => Some(Form::Poached),
            "stewed" => Some(Form::Stewed),
            "simmered" => Some(Form::Simmered),
            _ => None,
        }
    }
}

/// A vision model's food prediction (spec.md §6 input prediction format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    /// Empty string means "no form predicted"; normalized to `None` on read.
    #[serde(default)]
    pub form: String,
    pub mass_g: f64,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Prediction {
    pub fn form(&self) -> Option<Form> {
        if self.form.trim().is_empty() {
            None
        } else {
            Form::parse(&self.form)
        }
    }
}

/// Stable snake_case food identity, distinct from the free-text predicted name.
pub type CoreClass = String;

/// The catalog tier a `CatalogEntry` belongs to (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Foundation,
    SrLegacy,
    Branded,
    StagezProxy,
}

impl Source {
    /// Higher is preferred in tie-breaking (spec.md §4.4: foundation > sr_legacy > branded).
    pub fn priority(&self) -> u8 {
        match self {
            Source::Foundation => 3,
            Source::SrLegacy => 2,
            Source::Branded => 1,
            Source::StagezProxy => 0,
        }
    }

    pub fn is_foundation_or_legacy(&self) -> bool {
        matches!(self, Source::Foundation | Source::SrLegacy)
    }
}

/// A candidate's cooking form as carried on the catalog entry itself. This is
/// looser than `Form` because catalog text is free-form ("raw", "cooked,
/// roasted", "energy_only_proxy", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryForm {
    Raw,
    Cooked(String),
    EnergyOnlyProxy,
}

impl EntryForm {
    pub fn is_raw(&self) -> bool {
        matches!(self, EntryForm::Raw)
    }
}

/// One row of the FDC-style catalog (spec.md §3).
///
/// Invariant: `source == StagezProxy` implies `protein_100g`/`carbs_100g`/
/// `fat_100g` are `None` — only `kcal_100g` is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub fdc_id: u64,
    pub name: String,
    pub source: Source,
    pub form: EntryForm,
    pub kcal_100g: f64,
    pub protein_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub sodium_mg_100g: Option<f64>,
    pub sugar_g_100g: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl CatalogEntry {
    pub fn is_stagez_proxy(&self) -> bool {
        matches!(self.source, Source::StagezProxy)
    }
}

/// Reason the method resolver settled on a given method (spec.md §3/§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodReason {
    Explicit,
    Alias,
    ConversionConfig,
    ClassDefault,
    CategoryDefault,
    FirstAvailable,
}

impl MethodReason {
    /// Confidence penalty applied once per prediction (spec.md §4.3).
    pub fn confidence_penalty(&self) -> f64 {
        match self {
            MethodReason::Explicit => 0.00,
            MethodReason::Alias => -0.05,
            MethodReason::ConversionConfig => -0.10,
            MethodReason::ClassDefault => -0.10,
            MethodReason::CategoryDefault => -0.15,
            MethodReason::FirstAvailable => -0.20,
        }
    }
}

/// `(method, reason)` emitted once per prediction by the method resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodResolution {
    pub method: String,
    pub reason: MethodReason,
}

impl MethodResolution {
    pub fn inferred(&self) -> bool {
        self.reason != MethodReason::Explicit
    }
}

/// Mass-change + retention kernel parameters for one (core_class, method)
/// pair (spec.md §3 ConversionProfile).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionProfile {
    /// Hydration growth factor, e.g. 2.8 for rice (mutually exclusive with shrink_fraction).
    #[serde(default)]
    pub hydration_factor: Option<f64>,
    /// Fraction of raw mass lost to cooking, e.g. 0.29 for chicken breast.
    #[serde(default)]
    pub shrink_fraction: Option<f64>,
    /// Surface oil pickup in g/100g of cooked product.
    #[serde(default)]
    pub oil_uptake_g_100g: Option<f64>,
    /// Fraction of raw fat rendered out during cooking.
    #[serde(default)]
    pub fat_render_fraction: Option<f64>,
    /// Per-macro retention multiplier applied after mass change.
    #[serde(default)]
    pub protein_retention: Option<f64>,
    #[serde(default)]
    pub carbs_retention: Option<f64>,
    #[serde(default)]
    pub fat_retention: Option<f64>,
}

/// Plausibility band in kcal/100g for a (core_class, method) pair, with a
/// generic category fallback (spec.md §3 EnergyBand).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyBand {
    pub min_kcal_100g: f64,
    pub max_kcal_100g: f64,
}

impl EnergyBand {
    /// spec.md §4.2 rule 5: reject if outside `band * 1.2`. Inclusive at the
    /// boundary (spec.md §8: "Plausibility band at exactly max*1.2 is accepted").
    pub fn accepts_with_tolerance(&self, kcal_100g: f64, tolerance: f64) -> bool {
        let lo = self.min_kcal_100g / tolerance;
        let hi = self.max_kcal_100g * tolerance;
        kcal_100g >= lo && kcal_100g <= hi
    }
}

/// Final per-prediction output (spec.md §3 AlignmentResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub fdc_id: Option<u64>,
    pub fdc_name: Option<String>,
    pub kcal_100g: Option<f64>,
    pub protein_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub kcal_scaled: Option<f64>,
    pub protein_scaled: Option<f64>,
    pub carbs_scaled: Option<f64>,
    pub fat_scaled: Option<f64>,
    pub mass_g_used: f64,
    pub confidence: f64,
    pub telemetry: crate::telemetry::Telemetry,
}
