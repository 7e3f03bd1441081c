use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use foodalign_engine::batch::run_batch;
use foodalign_engine::catalog::{CatalogGateway, HttpCatalogGateway};
use foodalign_engine::cli::parse_args;
use foodalign_engine::config::ConfigStore;
use foodalign_engine::model::{AlignmentResult, Prediction};
use tokio::fs;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli_args = parse_args();
    println!("Input predictions file: {}", cli_args.predictions_file);

    let input_path = PathBuf::from(&cli_args.predictions_file);
    let output_path = cli_args
        .output_file
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(&input_path));

    let predictions_content = fs::read_to_string(&input_path)
        .await
        .with_context(|| format!("Failed to read predictions file '{}'", cli_args.predictions_file))?;
    let predictions: Vec<Prediction> = serde_json::from_str(&predictions_content)
        .with_context(|| "Failed to parse predictions JSON")?;
    println!("Loaded {} prediction(s).", predictions.len());

    let mut config = ConfigStore::load_defaults().with_context(|| "Failed to load default config tables")?;
    if let Some(concurrency) = cli_args.concurrency {
        config.flags.concurrency_ceiling = concurrency;
    }
    let config = Arc::new(config);

    let catalog: Arc<dyn CatalogGateway> = Arc::new(HttpCatalogGateway::with_base_url(
        &cli_args.api_key_env_var,
        cli_args.catalog_base_url.clone(),
    ));

    let progress_callback = |message: String| println!("{}", message);

    println!("\nAligning predictions against the FDC-style catalog...");
    let (results, summary) = match run_batch(predictions, config, catalog, progress_callback).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("\nBatch aborted: {e}");
            eprintln!("No output file written (a fatal invariant violation never yields a partial result).");
            return Err(e.into());
        }
    };
    println!(
        "\nBatch complete: {} prediction(s), {} error(s).",
        summary.total, summary.errors
    );
    let mut stages: Vec<(&String, &u32)> = summary.by_stage.iter().collect();
    stages.sort_by_key(|(stage, _)| stage.to_string());
    for (stage, count) in stages {
        println!("  {stage}: {count}");
    }

    let mut aligned: Vec<AlignmentResult> = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(alignment) => aligned.push(alignment),
            Err(e) => {
                eprintln!("Prediction failed to align: {e}");
                failures += 1;
            }
        }
    }

    let json_output = serde_json::to_string_pretty(&aligned)
        .with_context(|| "Failed to serialize alignment results to JSON")?;
    fs::write(&output_path, json_output)
        .await
        .with_context(|| format!("Failed to write aligned output to '{}'", output_path.display()))?;
    println!("\nAligned results saved to '{}'", output_path.display());

    if failures > 0 {
        println!("{failures} prediction(s) were skipped due to errors; see stderr above.");
    }

    Ok(())
}

fn default_output_path(input_path: &Path) -> PathBuf {
    let file_stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent_dir = input_path.parent().unwrap_or_else(|| Path::new(""));
    parent_dir.join(format!("{file_stem}_aligned.json"))
}
