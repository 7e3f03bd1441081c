//! The engine's feature-flag bundle (spec.md §6), modeled as an immutable
//! value constructed at startup and threaded explicitly into the engine —
//! never a mutable global — per spec.md §9's design note. Shape mirrors
//! `cli::Cli`: a flat serde-derivable struct with `Default`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    pub vision_mass_only: bool,
    pub prefer_raw_foundation_convert: bool,
    pub enable_proxy_alignment: bool,
    pub stagez_branded_fallback: bool,
    pub strict_cooked_exact_gate: bool,
    pub mass_soft_clamps: bool,
    pub starch_atwater_protein_floor: bool,
    pub branded_two_token_floor_25: bool,
    pub accept_sparse_stage2_on_floor: bool,
    pub use_color_tokens_for_produce: bool,
    /// Number of predictions the batch driver runs concurrently (spec.md §5).
    pub concurrency_ceiling: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            vision_mass_only: true,
            prefer_raw_foundation_convert: true,
            enable_proxy_alignment: true,
            stagez_branded_fallback: true,
            strict_cooked_exact_gate: true,
            mass_soft_clamps: true,
            starch_atwater_protein_floor: true,
            branded_two_token_floor_25: true,
            accept_sparse_stage2_on_floor: true,
            use_color_tokens_for_produce: true,
            concurrency_ceiling: 5,
        }
    }
}
