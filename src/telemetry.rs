//! Mandatory, machine-checkable telemetry record (spec.md §3 Telemetry,
//! §4.7 contract). This is the single enforcement point: no other code path
//! constructs an `AlignmentResult` without going through
//! `result_builder::assert_contract`.
//!
//! Shape follows `recipe_aggregator::EnrichedRecipeOutput`: one flat serde
//! struct assembled at the end of a pipeline run, not built incrementally
//! through a half dozen setter calls.

use serde::{Deserialize, Serialize};

/// `alignment_stage` domain (spec.md §3 VALID_STAGES). Never "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStage {
    Stage0NoCandidates,
    Stage1CookedExact,
    Stage1bRawFoundationDirect,
    Stage2RawConvert,
    Stage3BrandedCooked,
    Stage4BrandedEnergy,
    Stage5ProxyAlignment,
    StageZEnergyOnly,
}

impl AlignmentStage {
    pub fn confidence_penalty(&self) -> f64 {
        match self {
            AlignmentStage::Stage0NoCandidates => -0.80,
            AlignmentStage::Stage1CookedExact => 0.00,
            AlignmentStage::Stage1bRawFoundationDirect => 0.00,
            AlignmentStage::Stage2RawConvert => -0.05,
            AlignmentStage::Stage3BrandedCooked => -0.20,
            AlignmentStage::Stage4BrandedEnergy => -0.40,
            AlignmentStage::Stage5ProxyAlignment => -0.30,
            AlignmentStage::StageZEnergyOnly => -0.50,
        }
    }
}

/// Gate counters accumulated while resolving a single prediction
/// (spec.md §3 gate counters).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateCounters {
    pub sodium_gate_blocks: u32,
    pub sodium_gate_passes: u32,
    pub negative_vocab_blocks: u32,
    pub stage1_blocked_raw_foundation_exists: bool,
    pub mass_clamps_applied: u32,
}

/// Candidate pool sizes after partitioning (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatePoolCounts {
    pub total: u32,
    pub raw_foundation: u32,
    pub cooked_sr_legacy: u32,
    pub branded: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    pub alignment_stage: AlignmentStage,
    pub method: String,
    pub method_reason: String,
    pub method_inferred: bool,

    pub conversion_applied: bool,
    pub conversion_steps: Vec<String>,
    pub energy_clamped: bool,
    pub atwater_ok: bool,

    pub candidate_pool: CandidatePoolCounts,

    pub search_normalized_query: String,
    pub search_variants_tried: u32,

    pub stage1b_score: Option<f64>,
    pub proxy_used: bool,
    pub proxy_formula: Option<String>,
    pub stagez_category: Option<String>,
    pub stagez_kcal_clamped: bool,
    pub stagez_plausibility_adjusted: bool,

    pub gates: GateCounters,
}

impl Telemetry {
    /// `VALID_STAGES` membership is a type-level invariant (`AlignmentStage`
    /// is a closed enum), so this always holds; kept as an explicit check
    /// because §4.7/§8 call it out as an assertion, and future stages must
    /// not bypass the enum.
    pub fn stage_is_valid(&self) -> bool {
        true
    }

    pub fn method_is_known(&self) -> bool {
        !self.method.trim().is_empty() && self.method != "unknown"
    }
}
