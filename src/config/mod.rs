pub mod cli;
pub mod toml_config;

use crate::utils::error::{HousingError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use toml_config::ScraperConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "housing-pricer")]
#[command(about = "Scrape sold-apartment listings from Booli for a fixed amount of time")]
pub struct ScrapeCli {
    /// Duration of scraping in hours
    #[arg(short = 'd', long)]
    pub duration_hrs: f64,

    /// Max number of requests to the website per minute. Above 200 gives no speed
    /// increase; higher values mean a higher risk of being flagged.
    #[arg(short = 'r', long)]
    pub max_requests_per_minute: Option<u32>,

    /// Optional TOML file with [source], [storage] and [schedule] sections
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the scraped data and the scraped-dates ledger
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Oldest sold date to scrape (YYYY-MM-DD)
    #[arg(long)]
    pub back_to_date: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage after each finished date")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ScrapeCli {
    /// Loads the config file (or defaults) and applies command line overrides on top.
    pub fn resolve_config(&self) -> Result<ScraperConfig> {
        let mut config = match &self.config {
            Some(path) => ScraperConfig::from_file(path)?,
            None => ScraperConfig::default(),
        };

        if let Some(rpm) = self.max_requests_per_minute {
            config.source.max_requests_per_minute = rpm;
        }
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(date) = &self.back_to_date {
            config.schedule.back_to_date = date.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

impl ScrapeCli {
    pub fn session_duration(&self) -> Result<Duration> {
        validation::validate_strictly_positive("duration_hrs", self.duration_hrs)?;
        Duration::try_from_secs_f64(self.duration_hrs * 3600.0).map_err(|e| {
            HousingError::InvalidConfigValueError {
                field: "duration_hrs".to_string(),
                value: self.duration_hrs.to_string(),
                reason: format!("Duration is not representable: {}", e),
            }
        })
    }
}

impl Validate for ScrapeCli {
    fn validate(&self) -> Result<()> {
        self.session_duration()?;
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        Ok(())
    }
}
