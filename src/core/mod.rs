pub mod data_manager;
pub mod etl;
pub mod scraped_dates;
pub mod scraper;

pub use crate::domain::model::{ScrapedEntry, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
