pub mod app;
pub mod booli;
pub mod config;
pub mod core;
pub mod domain;
pub mod processing;
pub mod utils;
pub mod valuation;

pub use app::pipelines::ListingsPipeline;
pub use config::{cli::LocalStorage, toml_config::ScraperConfig, ScrapeCli};
pub use core::{
    data_manager::DataManager, etl::EtlEngine, scraped_dates::ScrapedDatesManager,
    scraper::Scraper,
};
pub use utils::error::{HousingError, Result};
