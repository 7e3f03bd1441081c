//! Batch orchestration (spec.md §5): normalize -> search -> classify ->
//! resolve method -> run the stage pipeline -> clamp mass -> build the
//! result, for every prediction in the input array, capped at
//! `EngineConfig::concurrency_ceiling` concurrent predictions.
//!
//! Grounded on `main.rs`'s top-level driver loop and progress printing, with
//! the sequential `for` loop replaced by a `tokio::task::JoinSet` bounded by
//! a `tokio::sync::Semaphore` — a permit-per-unit-of-work shape this engine
//! needs (many predictions in flight) that `tokio` already supports.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::catalog::CatalogGateway;
use crate::classifier::{self, Partition};
use crate::config::ConfigStore;
use crate::error::EngineError;
use crate::method_resolver;
use crate::model::{AlignmentResult, CatalogEntry, Prediction};
use crate::normalizer;
use crate::pipeline::{self, PipelineContext, Stage5Support};
use crate::result_builder::{self, BuildInputs};
use crate::telemetry::{CandidatePoolCounts, GateCounters};

const SEARCH_LIMIT: usize = 25;

/// Searches the catalog with the spec.md §7 `CatalogUnavailable` recovery:
/// one `reconnect()`, retry once, and on a second failure fall through to
/// an empty result (Stage 0) rather than propagating the error out of the
/// prediction. Errors other than `CatalogUnavailable` propagate immediately.
async fn search_with_recovery(
    catalog: &dyn CatalogGateway,
    query: &str,
    limit: usize,
) -> Result<Vec<CatalogEntry>, EngineError> {
    match catalog.search(query, limit).await {
        Ok(entries) => Ok(entries),
        Err(EngineError::CatalogUnavailable(_)) => {
            let _ = catalog.reconnect().await;
            match catalog.search(query, limit).await {
                Ok(entries) => Ok(entries),
                Err(EngineError::CatalogUnavailable(_)) => Ok(Vec::new()),
                Err(other) => Err(other),
            }
        }
        Err(other) => Err(other),
    }
}

fn resolve_core_class(prediction_name: &str, variants: &[String], tables: &crate::config::JsonTables) -> String {
    for variant in variants {
        let key = variant.replace(' ', "_");
        if let Some(core) = tables.class_aliases.get(&key) {
            return core.clone();
        }
        if let Some(core) = tables.class_aliases.get(variant) {
            return core.clone();
        }
    }
    prediction_name.trim().to_lowercase().replace(' ', "_")
}

fn color_species_token(core_class: &str, prediction: &Prediction, tables: &crate::config::JsonTables) -> Option<String> {
    let dimension = tables.color_species_dimensions.get(core_class)?;
    prediction
        .modifiers
        .iter()
        .map(|m| m.to_lowercase())
        .find(|m| dimension.values.contains(m))
}

fn stage5_keywords_for(core_class: &str) -> &'static [&'static str] {
    match core_class {
        "leafy_mixed_salad" => &["romaine", "green_leaf"],
        "squash_summer_yellow" => &["zucchini"],
        "tofu_plain_raw" => &["tofu"],
        _ => &[],
    }
}

/// Runs the full engine for one prediction. Public so integration tests and
/// the CLI can call it directly without going through the batch fan-out.
pub async fn align_one(
    prediction: &Prediction,
    config: &ConfigStore,
    catalog: &dyn CatalogGateway,
) -> Result<AlignmentResult, EngineError> {
    let normalized = normalizer::normalize(&prediction.name, &config.tables);
    let core_class = resolve_core_class(&prediction.name, &normalized.variants, &config.tables);
    let predicted_form = prediction.form();
    let color_token = color_species_token(&core_class, prediction, &config.tables);

    let mut counters = GateCounters::default();
    let mut partition = Partition::default();
    let mut variants_tried: u32 = 0;
    let mut last_query = normalized.first().to_string();

    for variant in &normalized.variants {
        variants_tried += 1;
        last_query = variant.clone();

        let candidates = search_with_recovery(catalog, variant, SEARCH_LIMIT).await?;
        if candidates.is_empty() {
            continue;
        }

        partition = classifier::classify(
            candidates,
            &core_class,
            predicted_form,
            color_token.as_deref(),
            &config.tables,
            &config.energy_bands,
            config.flags.use_color_tokens_for_produce,
            &mut counters,
        );
        if partition.total() > 0 {
            break;
        }
    }

    let method = method_resolver::resolve(&core_class, predicted_form.map(|f| f.as_str()), &config.tables);

    let mut stage5_support = Stage5Support::default();
    for keyword in stage5_keywords_for(&core_class) {
        let entries = search_with_recovery(catalog, keyword, SEARCH_LIMIT).await?;
        stage5_support.components.insert((*keyword).to_string(), entries);
    }

    let predicted_energy_anchor = config
        .energy_bands
        .generic(&core_class)
        .map(|band| (band.min_kcal_100g + band.max_kcal_100g) / 2.0);

    let ctx = PipelineContext {
        core_class: &core_class,
        predicted_form,
        method: &method,
        config,
        partition: &partition,
        predicted_energy_anchor,
        stage5_support,
    };
    let stage_result = pipeline::run(&ctx);
    counters.stage1_blocked_raw_foundation_exists = stage_result.stage1_blocked_raw_foundation_exists;

    let candidate_pool = CandidatePoolCounts {
        total: partition.total() as u32,
        raw_foundation: partition.raw_foundation.len() as u32,
        cooked_sr_legacy: partition.cooked_foundation_sr.len() as u32,
        branded: partition.branded.len() as u32,
    };

    let inputs = BuildInputs {
        mass_g: prediction.mass_g,
        core_class: &core_class,
        method: &method,
        stage_result,
        candidate_pool,
        gates: counters,
        search_normalized_query: last_query,
        search_variants_tried: variants_tried,
        predicted_energy_anchor,
    };

    result_builder::build(inputs, config)
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub by_stage: HashMap<String, u32>,
    pub errors: usize,
}

/// Runs every prediction through `align_one`, capped at
/// `config.flags.concurrency_ceiling` concurrent in-flight predictions.
/// Results are returned in input order. `progress` is an injectable
/// `impl Fn(String)`, the same shape `main.rs` passes down for console output.
///
/// An `InvariantViolation` is fatal at the batch level (spec.md §7): the
/// remaining in-flight predictions are aborted and the error is returned
/// instead of a partial result set — the caller must not write a partial
/// output file. Every other `EngineError` is tallied into `summary.errors`
/// and the batch continues.
pub async fn run_batch(
    predictions: Vec<Prediction>,
    config: Arc<ConfigStore>,
    catalog: Arc<dyn CatalogGateway>,
    progress: impl Fn(String),
) -> Result<(Vec<Result<AlignmentResult, EngineError>>, BatchSummary), EngineError> {
    let semaphore = Arc::new(Semaphore::new(config.flags.concurrency_ceiling.max(1)));
    let mut tasks = JoinSet::new();

    for (index, prediction) in predictions.into_iter().enumerate() {
        let permit_source = Arc::clone(&semaphore);
        let config = Arc::clone(&config);
        let catalog = Arc::clone(&catalog);

        tasks.spawn(async move {
            let _permit = permit_source.acquire_owned().await.expect("semaphore never closes");
            let result = align_one(&prediction, &config, catalog.as_ref()).await;
            (index, prediction.name, result)
        });
    }

    let mut ordered: Vec<Option<Result<AlignmentResult, EngineError>>> = Vec::new();
    let mut summary = BatchSummary::default();

    while let Some(joined) = tasks.join_next().await {
        let (index, name, result) = joined.expect("prediction task panicked");

        if let Err(EngineError::InvariantViolation(msg)) = &result {
            progress(format!("{name}: invariant violation ({msg}); aborting batch"));
            tasks.abort_all();
            return Err(EngineError::InvariantViolation(msg.clone()));
        }

        if ordered.len() <= index {
            ordered.resize_with(index + 1, || None);
        }

        match &result {
            Ok(aligned) => {
                let stage_name = format!("{:?}", aligned.telemetry.alignment_stage);
                *summary.by_stage.entry(stage_name.clone()).or_insert(0) += 1;
                progress(format!("{name}: resolved at {stage_name} (confidence {:.2})", aligned.confidence));
            }
            Err(err) => {
                summary.errors += 1;
                progress(format!("{name}: failed ({err})"));
            }
        }

        ordered[index] = Some(result);
        summary.total += 1;
    }

    let results = ordered.into_iter().map(|r| r.expect("every index filled")).collect();
    Ok((results, summary))
}
