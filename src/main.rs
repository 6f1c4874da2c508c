use chrono::{Local, NaiveDate};
use clap::Parser;
use housing_pricer::booli::{scrape_listings, ScrapeOptions};
use housing_pricer::domain::ports::ConfigProvider;
use housing_pricer::utils::monitor::SystemMonitor;
use housing_pricer::utils::validation::{Validate, DATE_FORMAT};
use housing_pricer::utils::{logger, shutdown};
use housing_pricer::{DataManager, HousingError, ScrapeCli, ScrapedDatesManager, Scraper};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = ScrapeCli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting housing-pricer scraper");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Scraping failed: {} (Category: {:?}, Severity: {:?})",
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

    Ok(())
}

async fn run(cli: &ScrapeCli) -> Result<(), HousingError> {
    cli.validate()?;
    let config = cli.resolve_config()?;

    let monitor = SystemMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let data_manager = DataManager::open_with_filename(config.data_dir(), config.data_filename())?;
    tracing::info!(
        "📦 {} listings already stored in {}",
        data_manager.entry_count(),
        data_manager.data_file_path().display()
    );
    let mut dates_manager =
        ScrapedDatesManager::open_with_filename(config.data_dir(), config.dates_filename())?;
    let mut scraper = Scraper::new(&config, data_manager)?;

    let options = ScrapeOptions {
        duration: cli.session_duration()?,
        back_to_date: NaiveDate::parse_from_str(config.back_to_date(), DATE_FORMAT)?,
        today: Local::now().date_naive(),
        first_page: config.schedule.first_page,
    };

    let shutdown = shutdown::shutdown_token();
    let result = scrape_listings(
        &mut scraper,
        &mut dates_manager,
        &options,
        &shutdown,
        &monitor,
    )
    .await;

    scraper.data_manager.close()?;
    let summary = result?;
    monitor.log_final_stats();

    println!(
        "✅ Scraped {} listings over {} completed dates ({:?})",
        summary.listings_scraped, summary.dates_completed, summary.stop_reason
    );
    Ok(())
}
