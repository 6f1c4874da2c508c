use anyhow::{Context, Result};
use clap::Parser;
use housing_pricer::utils::logger;
use housing_pricer::valuation::{Geocoder, TrainingDomain, ValuationRequest, DEFAULT_GEOCODER_URL};

#[derive(Parser, Debug)]
#[command(name = "prepare-valuation")]
#[command(about = "Geocode a valuation request and validate it against the training domain")]
struct Args {
    /// JSON file with the address, construction year and living area
    #[arg(short, long)]
    request: String,

    /// JSON file with per-feature min/max of the training data
    #[arg(short, long, default_value = "training_domain.json")]
    training_domain: String,

    /// Maps place search URL used for geocoding
    #[arg(long, default_value = DEFAULT_GEOCODER_URL)]
    geocoder_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let request = ValuationRequest::from_file(&args.request)
        .with_context(|| format!("Failed to read request '{}'", args.request))?;
    tracing::info!("Read request {:?}", request);

    let coordinates = match request.coordinates() {
        Some(coordinates) => coordinates,
        None => {
            tracing::info!("📍 Geocoding {:?}", request.address);
            Geocoder::new(&args.geocoder_url)?
                .geocode(&request.address)
                .await
                .context("Failed to geocode the requested address")?
        }
    };

    let domain = TrainingDomain::from_file(&args.training_domain).with_context(|| {
        format!("Failed to read training domain '{}'", args.training_domain)
    })?;

    let model_input = request.into_model_input(coordinates);
    model_input
        .validate_against(&domain)
        .context("Request lies outside the training domain")?;

    tracing::info!("✅ Model input is within the training domain");
    println!("{}", serde_json::to_string_pretty(&model_input)?);
    Ok(())
}
