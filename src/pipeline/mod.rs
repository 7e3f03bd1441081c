//! The stage dispatch state machine (spec.md §4.4): `Start -> S1 -> S1b ->
//! S2 -> S3or4 -> S5 -> Sz -> S0`. Grounded on
//! `nutritional_matcher::find_and_calculate_nutrition`'s sequential
//! decision shape, generalized into the closed-variant dispatch spec.md §9
//! calls for: each stage either produces a terminal result or declines.

pub mod scoring;
mod stage1;
mod stage1b;
mod stage2;
mod stage3_4;
mod stage5;
mod stagez;

use std::collections::HashMap;

use crate::classifier::Partition;
use crate::config::ConfigStore;
use crate::model::{CatalogEntry, Form, MethodResolution};
use crate::telemetry::AlignmentStage;

/// Catalog pools fetched ahead of stage dispatch for Stage 5's proxy
/// components, keyed by component search term (e.g. `"romaine"`,
/// `"zucchini"`). Populated by the batch driver, which owns the catalog
/// gateway and every suspension point (spec.md §5: "no suspension inside
/// the stage pipeline"); empty for predictions whose core class is not in
/// the Stage-5 whitelist.
#[derive(Debug, Clone, Default)]
pub struct Stage5Support {
    pub components: HashMap<String, Vec<CatalogEntry>>,
}

/// Per-prediction state threaded through every stage function.
pub struct PipelineContext<'a> {
    pub core_class: &'a str,
    pub predicted_form: Option<Form>,
    pub method: &'a MethodResolution,
    pub config: &'a ConfigStore,
    pub partition: &'a Partition,
    /// Reference kcal/100g used for every energy-gated comparison when the
    /// prediction itself carries none (mass-only mode); see DESIGN.md open
    /// question 4.
    pub predicted_energy_anchor: Option<f64>,
    pub stage5_support: Stage5Support,
}

#[derive(Debug, Clone, Default)]
pub struct StageResult {
    pub stage: Option<AlignmentStage>,
    pub fdc_id: Option<u64>,
    pub fdc_name: Option<String>,
    pub kcal_100g: Option<f64>,
    pub protein_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub conversion_applied: bool,
    pub conversion_steps: Vec<String>,
    pub energy_clamped: bool,
    pub atwater_ok: bool,
    pub stage1b_score: Option<f64>,
    pub proxy_used: bool,
    pub proxy_formula: Option<String>,
    pub stagez_category: Option<String>,
    pub stagez_kcal_clamped: bool,
    pub stagez_plausibility_adjusted: bool,
    pub sparse_accept: bool,
    pub energy_close: bool,
    pub stage1_blocked_raw_foundation_exists: bool,
}

/// Forms whose cooking method implies a conversion away from raw is viable
/// (spec.md §4.4 pre-gate).
fn form_suggests_conversion(form: Option<Form>) -> bool {
    !matches!(form, None | Some(Form::Raw))
}

/// Runs the full stage cascade for one already-classified, already
/// method-resolved prediction. Always returns a result — Stage 0 is the
/// backstop.
pub fn run(ctx: &PipelineContext) -> StageResult {
    let pre_gate_skips_stage1 = !ctx.partition.raw_foundation.is_empty()
        && (form_suggests_conversion(ctx.predicted_form)
            || ctx.config.tables.conversion_profiles.contains_key(ctx.core_class))
        && ctx.config.flags.prefer_raw_foundation_convert;

    let mut result = dispatch(ctx, pre_gate_skips_stage1);
    result.stage1_blocked_raw_foundation_exists = pre_gate_skips_stage1;
    result
}

fn dispatch(ctx: &PipelineContext, pre_gate_skips_stage1: bool) -> StageResult {
    if !pre_gate_skips_stage1 {
        if let Some(mut result) = stage1::attempt(ctx) {
            result.stage = Some(AlignmentStage::Stage1CookedExact);
            return result;
        }
    }

    if let Some(mut result) = stage1b::attempt(ctx) {
        result.stage = Some(AlignmentStage::Stage1bRawFoundationDirect);
        return result;
    }

    if let Some(mut result) = stage2::attempt(ctx) {
        result.stage = Some(AlignmentStage::Stage2RawConvert);
        return result;
    }

    if let Some(mut result) = stage3_4::attempt_stage3(ctx) {
        result.stage = Some(AlignmentStage::Stage3BrandedCooked);
        return result;
    }

    if let Some(mut result) = stage3_4::attempt_stage4(ctx) {
        result.stage = Some(AlignmentStage::Stage4BrandedEnergy);
        return result;
    }

    if ctx.config.flags.enable_proxy_alignment {
        if let Some(mut result) = stage5::attempt(ctx) {
            result.stage = Some(AlignmentStage::Stage5ProxyAlignment);
            return result;
        }
    }

    if ctx.config.flags.stagez_branded_fallback {
        if let Some(mut result) = stagez::attempt(ctx) {
            result.stage = Some(AlignmentStage::StageZEnergyOnly);
            return result;
        }
    }

    StageResult {
        stage: Some(AlignmentStage::Stage0NoCandidates),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier;
    use crate::config::ConfigStore;
    use crate::method_resolver;
    use crate::model::{CatalogEntry, EntryForm, Source};
    use crate::telemetry::GateCounters;

    fn entry(fdc_id: u64, name: &str, source: Source, form: EntryForm, kcal: f64) -> CatalogEntry {
        CatalogEntry {
            fdc_id,
            name: name.to_string(),
            source,
            form,
            kcal_100g: kcal,
            protein_100g: Some(20.0),
            carbs_100g: Some(0.0),
            fat_100g: Some(3.0),
            sodium_mg_100g: None,
            sugar_g_100g: None,
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn grapes_raw_resolves_via_stage1b() {
        let store = ConfigStore::load_defaults().unwrap();
        let mut counters = GateCounters::default();
        let candidates = vec![entry(10, "Grapes, raw", Source::Foundation, EntryForm::Raw, 69.0)];
        let partition = classifier::classify(
            candidates,
            "grape",
            Some(Form::Raw),
            None,
            &store.tables,
            &store.energy_bands,
            true,
            &mut counters,
        );
        let method = method_resolver::resolve("grape", Some("raw"), &store.tables);
        let ctx = PipelineContext {
            core_class: "grape",
            predicted_form: Some(Form::Raw),
            method: &method,
            config: &store,
            partition: &partition,
            predicted_energy_anchor: store.energy_bands.generic("grape").map(|b| (b.min_kcal_100g + b.max_kcal_100g) / 2.0),
            stage5_support: Stage5Support::default(),
        };
        let result = run(&ctx);
        assert_eq!(result.stage, Some(AlignmentStage::Stage1bRawFoundationDirect));
        assert_eq!(result.fdc_id, Some(10));
    }

    #[test]
    fn chicken_breast_grilled_resolves_via_stage2() {
        let store = ConfigStore::load_defaults().unwrap();
        let mut counters = GateCounters::default();
        let candidates = vec![entry(20, "Chicken, breast, raw", Source::Foundation, EntryForm::Raw, 120.0)];
        let partition = classifier::classify(
            candidates,
            "chicken_breast",
            Some(Form::Grilled),
            None,
            &store.tables,
            &store.energy_bands,
            true,
            &mut counters,
        );
        let method = method_resolver::resolve("chicken_breast", Some("grilled"), &store.tables);
        let ctx = PipelineContext {
            core_class: "chicken_breast",
            predicted_form: Some(Form::Grilled),
            method: &method,
            config: &store,
            partition: &partition,
            predicted_energy_anchor: Some(120.0),
            stage5_support: Stage5Support::default(),
        };
        let result = run(&ctx);
        assert_eq!(result.stage, Some(AlignmentStage::Stage2RawConvert));
        assert!(result.conversion_applied);
        assert!(result.stage1_blocked_raw_foundation_exists);
    }

    #[test]
    fn no_candidates_falls_through_to_stage0() {
        let store = ConfigStore::load_defaults().unwrap();
        let partition = Partition::default();
        let method = method_resolver::resolve("chicken_breast", Some("grilled"), &store.tables);
        let ctx = PipelineContext {
            core_class: "chicken_breast",
            predicted_form: Some(Form::Grilled),
            method: &method,
            config: &store,
            partition: &partition,
            predicted_energy_anchor: None,
            stage5_support: Stage5Support::default(),
        };
        let result = run(&ctx);
        assert_eq!(result.stage, Some(AlignmentStage::Stage0NoCandidates));
    }
}
