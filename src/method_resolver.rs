//! Method resolution cascade (spec.md §4.3). Produces exactly one
//! `(method, reason)` per prediction, once, before stage dispatch —
//! downstream stages consume `MethodResolution` and never re-infer.

use crate::config::JsonTables;
use crate::model::{MethodReason, MethodResolution};

/// Runs the six-step cascade in spec order; the first match wins.
pub fn resolve(core_class: &str, predicted_form: Option<&str>, tables: &JsonTables) -> MethodResolution {
    let profile = tables.conversion_profiles.get(core_class);

    if let Some(form) = predicted_form {
        if profile.map(|p| p.contains_key(form)).unwrap_or(false) {
            return MethodResolution { method: form.to_string(), reason: MethodReason::Explicit };
        }
    }

    if let Some(form) = predicted_form {
        if let Some(aliased) = tables.resolve_method_alias(form) {
            return MethodResolution { method: aliased.to_string(), reason: MethodReason::Alias };
        }
    }

    if let Some(form) = predicted_form {
        if let Some(overridden) = tables.form_method_override(core_class, form) {
            return MethodResolution { method: overridden.to_string(), reason: MethodReason::ConversionConfig };
        }
    }

    if let Some(default_method) = tables.class_method_defaults.get(core_class) {
        return MethodResolution { method: default_method.clone(), reason: MethodReason::ClassDefault };
    }

    if let Some(category) = tables.category_of(core_class) {
        if let Some(default_method) = tables.category_defaults.get(category) {
            return MethodResolution { method: default_method.clone(), reason: MethodReason::CategoryDefault };
        }
    }

    if let Some(profile) = profile {
        if let Some(first) = profile.keys().min() {
            return MethodResolution { method: first.clone(), reason: MethodReason::FirstAvailable };
        }
    }

    // Telemetry never carries "unknown" (spec.md §3 invariant); a class with
    // no profile, no default, and no category falls back to "raw" same as
    // fruit/vegetable's own category default.
    MethodResolution { method: "raw".to_string(), reason: MethodReason::FirstAvailable }
}
