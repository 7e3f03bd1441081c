//! Stage Z — energy-only last resort (spec.md §4.4). Eligible only for
//! categories {meat_poultry, fish_seafood, starch_grain, egg} when the raw
//! Foundation pool is empty.

use super::{PipelineContext, StageResult};

pub fn attempt(ctx: &PipelineContext) -> Option<StageResult> {
    if !ctx.partition.raw_foundation.is_empty() {
        return None;
    }

    let category = ctx.config.tables.category_of(ctx.core_class)?;
    if matches!(category, "fruit" | "nuts_seeds" | "vegetable") {
        return None;
    }
    let band = ctx.config.tables.stagez_category_band(category)?;
    let (lo, hi) = (band.min_kcal_100g, band.max_kcal_100g);

    let (kcal, plausibility_adjusted) = match ctx.predicted_energy_anchor {
        Some(anchor) if anchor < lo => (lo, true),
        Some(anchor) if anchor > hi => (hi, true),
        Some(anchor) => (anchor, false),
        None => ((lo + hi) / 2.0, false),
    };

    Some(StageResult {
        fdc_id: None,
        fdc_name: Some(format!("{} energy-only proxy", ctx.core_class)),
        kcal_100g: Some(kcal),
        protein_100g: None,
        carbs_100g: None,
        fat_100g: None,
        stagez_category: Some(category.to_string()),
        stagez_kcal_clamped: true,
        stagez_plausibility_adjusted: plausibility_adjusted,
        atwater_ok: true,
        ..Default::default()
    })
}
