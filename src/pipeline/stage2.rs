//! Stage 2 — raw + convert (spec.md §4.4/§4.5).

use super::scoring::{beats, class_tokens, energy_sim, token_overlap, tokenize};
use super::{PipelineContext, StageResult};
use crate::conversion::{self, Macros100g};

const ACCEPT_THRESHOLD: f64 = 1.6;
const SPARSE_FLOOR: f64 = 1.3;

pub fn attempt(ctx: &PipelineContext) -> Option<StageResult> {
    let class_tok = class_tokens(ctx.core_class, &ctx.config.tables);
    let mut best: Option<(f64, &crate::model::CatalogEntry)> = None;

    for entry in &ctx.partition.raw_foundation {
        let entry_tokens = tokenize(&entry.name);
        let overlap = token_overlap(&class_tok, &entry_tokens) as f64;
        let sim = ctx
            .predicted_energy_anchor
            .map(|anchor| energy_sim(anchor, entry.kcal_100g))
            .unwrap_or(1.0);
        let score = overlap + 0.6 * sim;

        if best
            .map(|(b, e)| beats(score, entry, b, e, ctx.predicted_energy_anchor))
            .unwrap_or(true)
        {
            best = Some((score, entry));
        }
    }

    let (score, entry) = best?;

    let sparse_accept = score < ACCEPT_THRESHOLD && score >= SPARSE_FLOOR;
    if score < ACCEPT_THRESHOLD && !(sparse_accept && ctx.config.flags.accept_sparse_stage2_on_floor && ctx.config.flags.vision_mass_only) {
        return None;
    }

    let profile = ctx.config.tables.conversion_profile(ctx.core_class, &ctx.method.method)?;

    let raw_macros = Macros100g {
        kcal: entry.kcal_100g,
        protein: entry.protein_100g.unwrap_or(0.0),
        carbs: entry.carbs_100g.unwrap_or(0.0),
        fat: entry.fat_100g.unwrap_or(0.0),
    };

    let outcome = conversion::convert(
        raw_macros,
        profile,
        ctx.core_class,
        &ctx.method.method,
        &ctx.config.energy_bands,
        ctx.config.flags.starch_atwater_protein_floor,
    );

    Some(StageResult {
        fdc_id: Some(entry.fdc_id),
        fdc_name: Some(entry.name.clone()),
        kcal_100g: Some(outcome.macros.kcal),
        protein_100g: Some(outcome.macros.protein),
        carbs_100g: Some(outcome.macros.carbs),
        fat_100g: Some(outcome.macros.fat),
        conversion_applied: true,
        conversion_steps: outcome.steps,
        energy_clamped: outcome.energy_clamped,
        atwater_ok: outcome.atwater_ok,
        sparse_accept,
        ..Default::default()
    })
}
