//! End-to-end scenarios (spec.md §8) driven through `batch::align_one`
//! against an `InMemoryCatalogGateway` fixture — no live network access,
//! same spirit as `tests/api_integration_tests.rs`'s provider-level checks
//! but exercising the full normalize -> search -> classify -> resolve ->
//! pipeline -> clamp -> build chain end to end.

use foodalign_engine::batch::align_one;
use foodalign_engine::catalog::InMemoryCatalogGateway;
use foodalign_engine::config::ConfigStore;
use foodalign_engine::method_resolver;
use foodalign_engine::model::{CatalogEntry, EntryForm, Prediction, Source};
use foodalign_engine::normalizer;
use foodalign_engine::telemetry::AlignmentStage;

fn prediction(name: &str, form: &str, mass_g: f64) -> Prediction {
    Prediction { name: name.to_string(), form: form.to_string(), mass_g, count: None, modifiers: Vec::new(), confidence: None }
}

fn entry(fdc_id: u64, name: &str, source: Source, form: EntryForm, kcal: f64, protein: f64, carbs: f64, fat: f64) -> CatalogEntry {
    CatalogEntry {
        fdc_id,
        name: name.to_string(),
        source,
        form,
        kcal_100g: kcal,
        protein_100g: Some(protein),
        carbs_100g: Some(carbs),
        fat_100g: Some(fat),
        sodium_mg_100g: None,
        sugar_g_100g: None,
        ingredients: Vec::new(),
    }
}

#[tokio::test]
async fn scenario_1_chicken_breast_grilled_converts_and_scales() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![entry(
        1,
        "Chicken, broilers, breast, raw",
        Source::Foundation,
        EntryForm::Raw,
        120.0,
        22.5,
        0.0,
        2.6,
    )]);

    let result = align_one(&prediction("chicken breast", "grilled", 150.0), &config, &catalog).await.unwrap();

    assert_eq!(result.telemetry.alignment_stage, AlignmentStage::Stage2RawConvert);
    assert_eq!(result.telemetry.method, "grilled");
    assert!(result.telemetry.conversion_steps.iter().any(|s| s.starts_with("shrinkage_29%")));
    assert!(result.telemetry.conversion_steps.iter().any(|s| s.starts_with("fat_render_5%")));
    let scaled = result.kcal_scaled.expect("kcal_scaled must be set");
    assert!((200.0..=300.0).contains(&scaled), "scaled kcal {scaled} out of range");
    assert!(result.confidence > 0.5 && result.confidence < 0.95);
}

#[tokio::test]
async fn scenario_2_grapes_raw_resolves_via_stage1b() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![entry(
        10,
        "Grapes, raw",
        Source::Foundation,
        EntryForm::Raw,
        67.0,
        0.7,
        18.0,
        0.2,
    )]);

    let result = align_one(&prediction("grapes", "raw", 100.0), &config, &catalog).await.unwrap();

    assert_eq!(result.telemetry.alignment_stage, AlignmentStage::Stage1bRawFoundationDirect);
    assert_eq!(result.telemetry.search_normalized_query, "grapes");
    assert!(result.telemetry.stage1b_score.unwrap_or(0.0) >= 0.50);
    let scaled = result.kcal_scaled.unwrap();
    assert!((60.0..=75.0).contains(&scaled));
}

#[tokio::test]
async fn scenario_3_egg_whites_raw_rejects_yolk() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![
        entry(20, "Egg, yolk, raw", Source::Foundation, EntryForm::Raw, 322.0, 16.0, 3.6, 27.0),
        entry(21, "Egg, white, raw", Source::Foundation, EntryForm::Raw, 52.0, 10.9, 0.7, 0.2),
    ]);

    let result = align_one(&prediction("egg whites", "raw", 50.0), &config, &catalog).await.unwrap();

    assert_eq!(result.telemetry.alignment_stage, AlignmentStage::Stage1bRawFoundationDirect);
    assert_eq!(result.fdc_id, Some(21));
    assert!(result.telemetry.gates.negative_vocab_blocks >= 1);
    let scaled = result.kcal_scaled.unwrap();
    assert!((20.0..=32.0).contains(&scaled));
}

#[tokio::test]
async fn scenario_4_hash_browns_fried_uses_conversion_config_method() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![entry(
        30,
        "Potato, russet, raw",
        Source::Foundation,
        EntryForm::Raw,
        77.0,
        2.0,
        17.0,
        0.1,
    )]);

    let result = align_one(&prediction("hash browns", "fried", 100.0), &config, &catalog).await.unwrap();

    assert_eq!(result.telemetry.alignment_stage, AlignmentStage::Stage2RawConvert);
    assert_eq!(result.telemetry.method, "hash_browns");
    assert_eq!(result.telemetry.method_reason, "ConversionConfig");
    assert!(result.telemetry.conversion_steps.iter().any(|s| s.starts_with("oil_uptake_11.5g")));
    let scaled = result.kcal_scaled.unwrap();
    assert!((150.0..=250.0).contains(&scaled), "scaled kcal {scaled} out of range");
}

#[tokio::test]
async fn scenario_5_mixed_salad_greens_resolves_via_stage5_composite_blend() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![
        entry(40, "Lettuce, romaine, raw", Source::Foundation, EntryForm::Raw, 15.0, 1.2, 3.3, 0.3),
        entry(41, "Lettuce, green_leaf, raw", Source::Foundation, EntryForm::Raw, 19.0, 1.4, 3.6, 0.4),
    ]);

    let result = align_one(&prediction("mixed salad greens", "raw", 55.0), &config, &catalog).await.unwrap();

    assert_eq!(result.telemetry.alignment_stage, AlignmentStage::Stage5ProxyAlignment);
    assert!(result.telemetry.proxy_used);
    let formula = result.telemetry.proxy_formula.as_deref().unwrap_or("");
    assert!(formula.contains("romaine") && formula.contains("green_leaf"));
    let kcal = result.kcal_100g.unwrap();
    assert!((14.0..=20.0).contains(&kcal));
    let scaled = result.kcal_scaled.unwrap();
    assert!((6.0..=12.0).contains(&scaled));
}

#[tokio::test]
async fn scenario_6_bacon_cooked_falls_to_stagez_and_mass_clamps() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![entry(
        50,
        "Bacon bits, imitation, branded snack",
        Source::Branded,
        EntryForm::Cooked("unspecified".to_string()),
        450.0,
        30.0,
        20.0,
        30.0,
    )]);

    let result = align_one(&prediction("bacon", "cooked", 10.0), &config, &catalog).await.unwrap();

    assert_eq!(result.telemetry.alignment_stage, AlignmentStage::StageZEnergyOnly);
    assert_eq!(result.telemetry.stagez_category.as_deref(), Some("meat_poultry"));
    let kcal = result.kcal_100g.unwrap();
    assert!((100.0..=300.0).contains(&kcal));
    assert!(result.protein_100g.is_none());
    assert!(result.carbs_100g.is_none());
    assert!(result.fat_100g.is_none());
    assert!(result.confidence <= 0.35);

    let clamped = align_one(&prediction("bacon", "cooked", 3.0), &config, &catalog).await.unwrap();
    assert_eq!(clamped.mass_g_used, 5.0);
}

#[tokio::test]
async fn pre_gate_blocks_stage1_when_raw_foundation_exists_and_form_is_convertible() {
    let config = ConfigStore::load_defaults().unwrap();
    let catalog = InMemoryCatalogGateway::new(vec![entry(
        60,
        "Chicken, breast, raw",
        Source::Foundation,
        EntryForm::Raw,
        120.0,
        22.5,
        0.0,
        2.6,
    )]);

    let result = align_one(&prediction("chicken breast", "grilled", 150.0), &config, &catalog).await.unwrap();
    assert_ne!(result.telemetry.alignment_stage, AlignmentStage::Stage1CookedExact);
}

#[tokio::test]
async fn method_resolution_is_idempotent_through_the_full_engine() {
    let config = ConfigStore::load_defaults().unwrap();
    let first = method_resolver::resolve("chicken_breast", Some("grilled"), &config.tables);
    let second = method_resolver::resolve("chicken_breast", Some(&first.method), &config.tables);
    assert_eq!(first.method, second.method);
}

#[tokio::test]
async fn query_normalization_is_idempotent_through_the_full_engine() {
    let config = ConfigStore::load_defaults().unwrap();
    let first = normalizer::normalize("grapes", &config.tables);
    let second = normalizer::normalize(first.first(), &config.tables);
    assert_eq!(second.variants[0], first.first());
}
