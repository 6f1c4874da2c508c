use clap::Parser;
use housing_pricer::config::toml_config::{DEFAULT_DATA_DIR, DEFAULT_DATA_FILENAME};
use housing_pricer::utils::logger;
use housing_pricer::utils::validation::validate_path;
use housing_pricer::{EtlEngine, ListingsPipeline, LocalStorage};

#[derive(Parser, Debug)]
#[command(name = "process-listings")]
#[command(about = "Flatten scraped Booli listings into a CSV table")]
struct Args {
    /// Directory holding the scraped data file
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Name of the scraped data file inside the data directory
    #[arg(long, default_value = DEFAULT_DATA_FILENAME)]
    data_filename: String,

    /// Directory to write listings.csv into
    #[arg(short, long, default_value = "processed")]
    output_dir: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log CPU and memory usage per phase
    #[arg(long)]
    monitor: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Processing scraped listings from {}", args.data_dir);

    if let Err(e) = validate_path("data_dir", &args.data_dir)
        .and_then(|_| validate_path("output_dir", &args.output_dir))
    {
        tracing::error!("❌ Argument validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(args.output_dir.clone());
    let pipeline = ListingsPipeline::new(
        storage,
        &args.data_dir,
        &args.data_filename,
        &args.output_dir,
    );
    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Processing completed successfully!");
            println!("✅ Processing completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Processing failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
