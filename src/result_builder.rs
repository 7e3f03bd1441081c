//! Result assembly and the telemetry contract (spec.md §4.7). The single
//! enforcement point: no other code path constructs an `AlignmentResult`.
//! Grounded on `recipe_aggregator::calculate_nutritional_profile`'s
//! assemble-then-validate shape.

use crate::config::ConfigStore;
use crate::error::EngineError;
use crate::mass_rails;
use crate::model::{AlignmentResult, MethodResolution};
use crate::pipeline::StageResult;
use crate::telemetry::{AlignmentStage, CandidatePoolCounts, GateCounters, Telemetry};

const BASE_CONFIDENCE: f64 = 0.85;
const SPARSE_CONFIDENCE_CEILING: f64 = 0.55;
const ENERGY_BONUS: f64 = 0.10;
const ENERGY_BONUS_TOLERANCE: f64 = 0.15;

pub struct BuildInputs<'a> {
    pub mass_g: f64,
    pub core_class: &'a str,
    pub method: &'a MethodResolution,
    pub stage_result: StageResult,
    pub candidate_pool: CandidatePoolCounts,
    pub gates: GateCounters,
    pub search_normalized_query: String,
    pub search_variants_tried: u32,
    pub predicted_energy_anchor: Option<f64>,
}

fn round_sig3(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let factor = 10f64.powi(2 - magnitude);
    (x * factor).round() / factor
}

pub fn build(inputs: BuildInputs, config: &ConfigStore) -> Result<AlignmentResult, EngineError> {
    let stage = inputs.stage_result.stage.ok_or_else(|| {
        EngineError::InvariantViolation("stage pipeline returned no alignment_stage".to_string())
    })?;

    let mass_clamp = if config.flags.mass_soft_clamps {
        let confidence_before_clamp = estimate_confidence(&inputs, stage, false);
        mass_rails::apply(inputs.mass_g, inputs.core_class, confidence_before_clamp, &config.mass_rails)
    } else {
        mass_rails::ClampOutcome { mass_g: inputs.mass_g, applied: false, provenance: None }
    };

    let confidence = estimate_confidence(&inputs, stage, true);

    let mass_g_used = mass_clamp.mass_g;
    let scale = mass_g_used / 100.0;

    let kcal_scaled = inputs.stage_result.kcal_100g.map(|v| round_sig3(v * scale));
    let protein_scaled = inputs.stage_result.protein_100g.map(|v| round_sig3(v * scale));
    let carbs_scaled = inputs.stage_result.carbs_100g.map(|v| round_sig3(v * scale));
    let fat_scaled = inputs.stage_result.fat_100g.map(|v| round_sig3(v * scale));

    let mut gates = inputs.gates;
    if mass_clamp.applied {
        gates.mass_clamps_applied += 1;
    }

    let telemetry = Telemetry {
        alignment_stage: stage,
        method: inputs.method.method.clone(),
        method_reason: format!("{:?}", inputs.method.reason),
        method_inferred: inputs.method.inferred(),
        conversion_applied: inputs.stage_result.conversion_applied,
        conversion_steps: inputs.stage_result.conversion_steps.clone(),
        energy_clamped: inputs.stage_result.energy_clamped,
        atwater_ok: inputs.stage_result.atwater_ok,
        candidate_pool: inputs.candidate_pool,
        search_normalized_query: inputs.search_normalized_query,
        search_variants_tried: inputs.search_variants_tried,
        stage1b_score: inputs.stage_result.stage1b_score,
        proxy_used: inputs.stage_result.proxy_used,
        proxy_formula: inputs.stage_result.proxy_formula.clone(),
        stagez_category: inputs.stage_result.stagez_category.clone(),
        stagez_kcal_clamped: inputs.stage_result.stagez_kcal_clamped,
        stagez_plausibility_adjusted: inputs.stage_result.stagez_plausibility_adjusted,
        gates,
    };

    let result = AlignmentResult {
        fdc_id: inputs.stage_result.fdc_id,
        fdc_name: inputs.stage_result.fdc_name,
        kcal_100g: inputs.stage_result.kcal_100g,
        protein_100g: inputs.stage_result.protein_100g,
        carbs_100g: inputs.stage_result.carbs_100g,
        fat_100g: inputs.stage_result.fat_100g,
        kcal_scaled,
        protein_scaled,
        carbs_scaled,
        fat_scaled,
        mass_g_used,
        confidence,
        telemetry,
    };

    assert_contract(&result, config)?;
    Ok(result)
}

fn estimate_confidence(inputs: &BuildInputs, stage: AlignmentStage, apply_sparse_ceiling: bool) -> f64 {
    let mut confidence = BASE_CONFIDENCE + inputs.method.reason.confidence_penalty() + stage.confidence_penalty();

    if let (Some(anchor), Some(kcal)) = (inputs.predicted_energy_anchor, inputs.stage_result.kcal_100g) {
        if anchor > 0.0 && (anchor - kcal).abs() / anchor <= ENERGY_BONUS_TOLERANCE {
            confidence += ENERGY_BONUS;
        }
    }

    confidence = confidence.clamp(0.05, 0.99);

    if apply_sparse_ceiling && inputs.stage_result.sparse_accept {
        confidence = confidence.min(SPARSE_CONFIDENCE_CEILING);
    }

    confidence
}

fn assert_contract(result: &AlignmentResult, _config: &ConfigStore) -> Result<(), EngineError> {
    if !result.telemetry.stage_is_valid() {
        return Err(EngineError::InvariantViolation("alignment_stage not in VALID_STAGES".to_string()));
    }
    if !result.telemetry.method_is_known() {
        return Err(EngineError::InvariantViolation("method is unknown".to_string()));
    }
    if result.telemetry.conversion_applied
        && !matches!(result.telemetry.alignment_stage, AlignmentStage::Stage2RawConvert)
    {
        return Err(EngineError::InvariantViolation(
            "conversion_applied set outside Stage 2".to_string(),
        ));
    }
    if result.fdc_id.is_none()
        && result.telemetry.proxy_used
        && result.telemetry.alignment_stage != AlignmentStage::Stage5ProxyAlignment
    {
        return Err(EngineError::InvariantViolation(
            "proxy_used set outside Stage 5".to_string(),
        ));
    }
    if result.telemetry.alignment_stage == AlignmentStage::Stage5ProxyAlignment {
        const WHITELIST_KEYWORDS: &[&str] = &["romaine", "green_leaf", "zucchini", "tofu"];
        let formula = result.telemetry.proxy_formula.as_deref().unwrap_or("");
        let has_keyword = WHITELIST_KEYWORDS.iter().any(|k| formula.contains(k));
        if !has_keyword {
            return Err(EngineError::InvariantViolation(
                "Stage 5 proxy_formula carries no whitelisted keyword".to_string(),
            ));
        }
    }
    if result.telemetry.alignment_stage == AlignmentStage::StageZEnergyOnly {
        if result.protein_100g.is_some() || result.carbs_100g.is_some() || result.fat_100g.is_some() {
            return Err(EngineError::InvariantViolation(
                "stagez_energy_only result carries non-null macros".to_string(),
            ));
        }
    }
    Ok(())
}
