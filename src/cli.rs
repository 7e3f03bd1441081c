use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON file holding an array of vision predictions.
    #[arg(short, long)]
    pub predictions_file: String,

    /// Path to write the array of AlignmentResult JSON to. Defaults to
    /// `<predictions_file stem>_aligned.json`.
    #[arg(short, long)]
    pub output_file: Option<String>,

    /// Base URL of the FDC-style catalog endpoint.
    #[arg(long, default_value = "https://api.nal.usda.gov/fdc/v1")]
    pub catalog_base_url: String,

    /// Environment variable holding the catalog API key.
    #[arg(long, default_value = "FDC_API_KEY")]
    pub api_key_env_var: String,

    /// Number of predictions aligned concurrently; overrides the engine
    /// config default when set.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
