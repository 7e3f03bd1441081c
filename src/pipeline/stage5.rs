//! Stage 5 — proxy alignment (spec.md §4.4), gated on
//! `enable_proxy_alignment` and `STAGE5_WHITELIST`. Three strategies:
//! composite_blend, name_lookup, macro_defaults.

use super::{PipelineContext, StageResult};
use crate::model::CatalogEntry;

const ENERGY_TOLERANCE: f64 = 0.20;

fn first_foundation_or_legacy(entries: &[CatalogEntry]) -> Option<&CatalogEntry> {
    entries.iter().find(|e| e.source.is_foundation_or_legacy())
}

fn passes_energy_gate(ctx: &PipelineContext, proxy_kcal: f64) -> bool {
    match ctx.predicted_energy_anchor {
        Some(anchor) if anchor > 0.0 => (anchor - proxy_kcal).abs() / anchor <= ENERGY_TOLERANCE,
        _ => true,
    }
}

fn blend(a: &CatalogEntry, b: &CatalogEntry, weight_a: f64) -> (f64, Option<f64>, Option<f64>, Option<f64>) {
    let weight_b = 1.0 - weight_a;
    let kcal = a.kcal_100g * weight_a + b.kcal_100g * weight_b;
    let blend_opt = |x: Option<f64>, y: Option<f64>| match (x, y) {
        (Some(x), Some(y)) => Some(x * weight_a + y * weight_b),
        _ => None,
    };
    (
        kcal,
        blend_opt(a.protein_100g, b.protein_100g),
        blend_opt(a.carbs_100g, b.carbs_100g),
        blend_opt(a.fat_100g, b.fat_100g),
    )
}

pub fn attempt(ctx: &PipelineContext) -> Option<StageResult> {
    if !ctx.config.tables.is_stage5_whitelisted(ctx.core_class) {
        return None;
    }

    match ctx.core_class {
        "leafy_mixed_salad" => {
            let romaine = ctx.stage5_support.components.get("romaine").and_then(|v| first_foundation_or_legacy(v))?;
            let green_leaf = ctx.stage5_support.components.get("green_leaf").and_then(|v| first_foundation_or_legacy(v))?;
            let (kcal, protein, carbs, fat) = blend(romaine, green_leaf, 0.5);
            if !passes_energy_gate(ctx, kcal) {
                return None;
            }
            Some(StageResult {
                fdc_id: None,
                fdc_name: Some("leafy_mixed_salad proxy (50% romaine + 50% green_leaf)".to_string()),
                kcal_100g: Some(kcal),
                protein_100g: protein,
                carbs_100g: carbs,
                fat_100g: fat,
                proxy_used: true,
                proxy_formula: Some("romaine+green_leaf".to_string()),
                atwater_ok: true,
                ..Default::default()
            })
        }
        "squash_summer_yellow" => {
            let zucchini = ctx.stage5_support.components.get("zucchini").and_then(|v| first_foundation_or_legacy(v))?;
            if !passes_energy_gate(ctx, zucchini.kcal_100g) {
                return None;
            }
            Some(StageResult {
                fdc_id: None,
                fdc_name: Some(format!("squash_summer_yellow proxy ({})", zucchini.name)),
                kcal_100g: Some(zucchini.kcal_100g),
                protein_100g: zucchini.protein_100g,
                carbs_100g: zucchini.carbs_100g,
                fat_100g: zucchini.fat_100g,
                proxy_used: true,
                proxy_formula: Some("zucchini".to_string()),
                atwater_ok: true,
                ..Default::default()
            })
        }
        "tofu_plain_raw" => {
            if let Some(tofu) = ctx.stage5_support.components.get("tofu").and_then(|v| first_foundation_or_legacy(v)) {
                if passes_energy_gate(ctx, tofu.kcal_100g) {
                    return Some(StageResult {
                        fdc_id: None,
                        fdc_name: Some(format!("tofu_plain_raw proxy ({})", tofu.name)),
                        kcal_100g: Some(tofu.kcal_100g),
                        protein_100g: tofu.protein_100g,
                        carbs_100g: tofu.carbs_100g,
                        fat_100g: tofu.fat_100g,
                        proxy_used: true,
                        proxy_formula: Some("tofu".to_string()),
                        atwater_ok: true,
                        ..Default::default()
                    });
                }
            }

            // macro_defaults: hard fallback when name_lookup yields nothing usable.
            const DEFAULT_KCAL: f64 = 76.0;
            const DEFAULT_PROTEIN: f64 = 8.0;
            const DEFAULT_CARBS: f64 = 1.9;
            const DEFAULT_FAT: f64 = 4.8;
            if !passes_energy_gate(ctx, DEFAULT_KCAL) {
                return None;
            }
            Some(StageResult {
                fdc_id: None,
                fdc_name: Some("tofu_plain_raw proxy (macro defaults)".to_string()),
                kcal_100g: Some(DEFAULT_KCAL),
                protein_100g: Some(DEFAULT_PROTEIN),
                carbs_100g: Some(DEFAULT_CARBS),
                fat_100g: Some(DEFAULT_FAT),
                proxy_used: true,
                proxy_formula: Some("tofu".to_string()),
                atwater_ok: true,
                ..Default::default()
            })
        }
        _ => None,
    }
}

