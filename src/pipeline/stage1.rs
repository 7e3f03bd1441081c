//! Stage 1 — cooked exact (spec.md §4.4).

use super::scoring::{beats, class_tokens, tokenize, token_overlap};
use super::{PipelineContext, StageResult};
use crate::model::EntryForm;

const ACCEPT_THRESHOLD: f64 = 1.6;
const ENERGY_TOLERANCE: f64 = 0.20;

pub fn attempt(ctx: &PipelineContext) -> Option<StageResult> {
    if !ctx.config.flags.strict_cooked_exact_gate {
        return score_candidates(ctx, false);
    }
    score_candidates(ctx, true)
}

fn score_candidates(ctx: &PipelineContext, enforce_energy_gate: bool) -> Option<StageResult> {
    let class_tok = class_tokens(ctx.core_class, &ctx.config.tables);
    let mut best: Option<(f64, &crate::model::CatalogEntry)> = None;

    for entry in &ctx.partition.cooked_foundation_sr {
        if enforce_energy_gate {
            if let Some(anchor) = ctx.predicted_energy_anchor {
                let tolerance = anchor * ENERGY_TOLERANCE;
                if (entry.kcal_100g - anchor).abs() > tolerance {
                    continue;
                }
            }
        }

        let EntryForm::Cooked(desc) = &entry.form else { continue };
        let desc_tokens = tokenize(desc);
        let compatible = desc_tokens
            .iter()
            .any(|token| ctx.config.tables.methods_compatible(&ctx.method.method, token));
        if !compatible {
            continue;
        }

        let entry_tokens = tokenize(&entry.name);
        let score = token_overlap(&class_tok, &entry_tokens) as f64;

        if best
            .map(|(b, e)| beats(score, entry, b, e, ctx.predicted_energy_anchor))
            .unwrap_or(true)
        {
            best = Some((score, entry));
        }
    }

    let (score, entry) = best?;
    if score < ACCEPT_THRESHOLD {
        return None;
    }

    Some(StageResult {
        fdc_id: Some(entry.fdc_id),
        fdc_name: Some(entry.name.clone()),
        kcal_100g: Some(entry.kcal_100g),
        protein_100g: entry.protein_100g,
        carbs_100g: entry.carbs_100g,
        fat_100g: entry.fat_100g,
        atwater_ok: true,
        ..Default::default()
    })
}
