//! Stage 1b — raw Foundation direct (spec.md §4.4).

use super::scoring::{beats, class_tokens, energy_sim, jaccard, tokenize};
use super::{PipelineContext, StageResult};
use crate::model::Form;

const DEFAULT_THRESHOLD: f64 = 0.55;
const TOLERANT_THRESHOLD: f64 = 0.50;

pub fn attempt(ctx: &PipelineContext) -> Option<StageResult> {
    if !matches!(ctx.predicted_form, None | Some(Form::Raw)) {
        return None;
    }

    let threshold = if ctx.config.tables.is_stage1b_tolerant(ctx.core_class) {
        TOLERANT_THRESHOLD
    } else {
        DEFAULT_THRESHOLD
    };

    let class_tok = class_tokens(ctx.core_class, &ctx.config.tables);
    let mut best: Option<(f64, &crate::model::CatalogEntry)> = None;

    for entry in &ctx.partition.raw_foundation {
        let entry_tokens = tokenize(&entry.name);
        let jac = jaccard(&class_tok, &entry_tokens);
        let sim = ctx
            .predicted_energy_anchor
            .map(|anchor| energy_sim(anchor, entry.kcal_100g))
            .unwrap_or(1.0);
        let score = 0.7 * jac + 0.3 * sim;

        if best
            .map(|(b, e)| beats(score, entry, b, e, ctx.predicted_energy_anchor))
            .unwrap_or(true)
        {
            best = Some((score, entry));
        }
    }

    let (score, entry) = best?;
    if score < threshold {
        return None;
    }

    Some(StageResult {
        fdc_id: Some(entry.fdc_id),
        fdc_name: Some(entry.name.clone()),
        kcal_100g: Some(entry.kcal_100g),
        protein_100g: entry.protein_100g,
        carbs_100g: entry.carbs_100g,
        fat_100g: entry.fat_100g,
        stage1b_score: Some(score),
        atwater_ok: true,
        ..Default::default()
    })
}
