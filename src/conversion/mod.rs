//! Conversion engine (spec.md §4.5): stackable kernels that transform a raw
//! entry's per-100g macros into the cooked equivalent for a resolved method.
//! Grounded on `recipe_converter`'s per-ingredient nutrient math, but run as
//! a fixed ordered pipeline of small functions instead of one monolithic
//! calculation, each appending its own provenance tag.

use crate::config::EnergyBands;
use crate::model::ConversionProfile;

#[derive(Debug, Clone, Copy)]
pub struct Macros100g {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub macros: Macros100g,
    pub steps: Vec<String>,
    pub energy_clamped: bool,
    pub atwater_ok: bool,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Applies every kernel the profile defines, in spec order, to a raw
/// entry's per-100g macros for one resolved method.
pub fn convert(
    raw: Macros100g,
    profile: &ConversionProfile,
    core_class: &str,
    method: &str,
    energy_bands: &EnergyBands,
    starch_atwater_protein_floor: bool,
) -> ConversionOutcome {
    let mut macros = raw;
    let mut steps = Vec::new();

    if let Some(factor) = profile.hydration_factor {
        macros.kcal /= factor;
        macros.protein /= factor;
        macros.carbs /= factor;
        macros.fat /= factor;
        steps.push(format!("hydration_x{:.2}", factor));
    }

    if let Some(shrink) = profile.shrink_fraction {
        let denom = 1.0 - shrink;
        macros.kcal /= denom;
        macros.protein /= denom;
        macros.carbs /= denom;
        macros.fat /= denom;
        steps.push(format!("shrinkage_{:.0}%", shrink * 100.0));
    }

    if let Some(render) = profile.fat_render_fraction {
        let rendered_fat = macros.fat * render;
        macros.fat -= rendered_fat;
        macros.kcal -= rendered_fat * 9.0;
        steps.push(format!("fat_render_{:.0}%", render * 100.0));
    }

    if let Some(uptake) = profile.oil_uptake_g_100g {
        macros.fat += uptake;
        macros.kcal += 9.0 * uptake;
        steps.push(format!("oil_uptake_{:.1}g", uptake));
    }

    if let Some(retention) = profile.protein_retention {
        macros.protein *= retention;
    }
    if let Some(retention) = profile.carbs_retention {
        macros.carbs *= retention;
    }
    if let Some(retention) = profile.fat_retention {
        macros.fat *= retention;
    }

    let mut energy_clamped = false;
    if let Some(band) = energy_bands.get(core_class, method) {
        if macros.kcal < band.min_kcal_100g {
            macros.kcal = band.min_kcal_100g;
            energy_clamped = true;
        } else if macros.kcal > band.max_kcal_100g {
            macros.kcal = band.max_kcal_100g;
            energy_clamped = true;
        }
        if energy_clamped {
            steps.push("energy_clamped".to_string());
        }
    }

    let atwater = 4.0 * macros.protein + 4.0 * macros.carbs + 9.0 * macros.fat;
    let skip_atwater = starch_atwater_protein_floor && macros.protein < 12.0;
    let mut atwater_ok = true;
    if !skip_atwater && atwater > 0.0 {
        let deviation = (macros.kcal - atwater).abs() / atwater;
        if deviation > 0.12 {
            macros.kcal = 0.7 * atwater + 0.3 * macros.kcal;
            atwater_ok = false;
            steps.push("atwater_corrected".to_string());
        }
    }

    macros.kcal = round2(macros.kcal);
    macros.protein = round2(macros.protein);
    macros.carbs = round2(macros.carbs);
    macros.fat = round2(macros.fat);

    ConversionOutcome { macros, steps, energy_clamped, atwater_ok }
}
