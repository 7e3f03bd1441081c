//! Soft per-class mass clamp (spec.md §4.6), applied to the predicted mass
//! before nutrients are scaled. Distinct from `config::csv_tables::MassRails`,
//! which only holds the `(lo, hi)` data — this module is the engine
//! behavior that consumes it.

use crate::config::csv_tables::MassRails;

#[derive(Debug, Clone)]
pub struct ClampOutcome {
    pub mass_g: f64,
    pub applied: bool,
    pub provenance: Option<String>,
}

/// Applies the §4.6 soft clamp when `confidence < 0.75` and a rail exists
/// for the class. A no-op at exactly `lo`/`hi` (spec.md §8 boundary law).
pub fn apply(mass_g: f64, core_class: &str, confidence: f64, rails: &MassRails) -> ClampOutcome {
    if confidence >= 0.75 {
        return ClampOutcome { mass_g, applied: false, provenance: None };
    }

    let Some(rail) = rails.get(core_class) else {
        return ClampOutcome { mass_g, applied: false, provenance: None };
    };

    if mass_g < rail.lo_g {
        let clamped = mass_g + 0.5 * (rail.lo_g - mass_g);
        return ClampOutcome {
            mass_g: clamped,
            applied: true,
            provenance: Some(format!("mass_clamp_lo_{:.1}g", clamped)),
        };
    }

    if mass_g > rail.hi_g {
        let clamped = mass_g - 0.5 * (mass_g - rail.hi_g);
        return ClampOutcome {
            mass_g: clamped,
            applied: true,
            provenance: Some(format!("mass_clamp_hi_{:.1}g", clamped)),
        };
    }

    ClampOutcome { mass_g, applied: false, provenance: None }
}
