//! Stage 3 — branded cooked exact, Stage 4 — branded energy fallback (spec.md §4.4).

use super::scoring::{beats, class_tokens, energy_sim, token_overlap, tokenize};
use super::{PipelineContext, StageResult};
use crate::model::CatalogEntry;

const STAGE3_SCORE_FLOOR: f64 = 2.0;
const STAGE3_MIN_OVERLAP: usize = 2;

const STAGE4_FLOOR_DEFAULT: f64 = 2.0;
const STAGE4_FLOOR_MEAT_TWO_TOKEN: f64 = 2.5;

fn to_result(entry: &CatalogEntry) -> StageResult {
    StageResult {
        fdc_id: Some(entry.fdc_id),
        fdc_name: Some(entry.name.clone()),
        kcal_100g: Some(entry.kcal_100g),
        protein_100g: entry.protein_100g,
        carbs_100g: entry.carbs_100g,
        fat_100g: entry.fat_100g,
        atwater_ok: true,
        ..Default::default()
    }
}

pub fn attempt_stage3(ctx: &PipelineContext) -> Option<StageResult> {
    let class_tok = class_tokens(ctx.core_class, &ctx.config.tables);
    let mut best: Option<(usize, &CatalogEntry)> = None;

    for entry in &ctx.partition.branded {
        let entry_tokens = tokenize(&entry.name);
        let overlap = token_overlap(&class_tok, &entry_tokens);
        if overlap < STAGE3_MIN_OVERLAP {
            continue;
        }
        if best
            .map(|(b, e)| beats(overlap as f64, entry, b as f64, e, ctx.predicted_energy_anchor))
            .unwrap_or(true)
        {
            best = Some((overlap, entry));
        }
    }

    let (overlap, entry) = best?;
    if (overlap as f64) < STAGE3_SCORE_FLOOR {
        return None;
    }

    Some(to_result(entry))
}

pub fn attempt_stage4(ctx: &PipelineContext) -> Option<StageResult> {
    let class_tok = class_tokens(ctx.core_class, &ctx.config.tables);
    let is_meat = ctx.config.tables.category_of(ctx.core_class) == Some("meat_poultry");

    let mut best: Option<(f64, usize, &CatalogEntry)> = None;

    for entry in &ctx.partition.branded {
        let entry_tokens = tokenize(&entry.name);
        let overlap = token_overlap(&class_tok, &entry_tokens);
        let sim = ctx
            .predicted_energy_anchor
            .map(|anchor| energy_sim(anchor, entry.kcal_100g))
            .unwrap_or(1.0);
        let score = overlap as f64 + 0.5 * sim;

        if best
            .map(|(b, _, e)| beats(score, entry, b, e, ctx.predicted_energy_anchor))
            .unwrap_or(true)
        {
            best = Some((score, overlap, entry));
        }
    }

    let (score, overlap, entry) = best?;

    let has_product_noun = overlap == 2
        && class_tok
            .intersection(&tokenize(&entry.name))
            .any(|token| ctx.config.tables.is_product_noun(token));

    let floor = if ctx.config.flags.branded_two_token_floor_25 && is_meat && has_product_noun {
        STAGE4_FLOOR_MEAT_TWO_TOKEN
    } else {
        STAGE4_FLOOR_DEFAULT
    };

    if score < floor {
        return None;
    }

    Some(to_result(entry))
}
