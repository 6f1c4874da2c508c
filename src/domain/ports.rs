use crate::domain::model::{ScrapedEntry, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings a scraping session needs, independent of where they came from.
pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn data_dir(&self) -> &str;
    fn data_filename(&self) -> &str;
    fn dates_filename(&self) -> &str;
    fn max_requests_per_minute(&self) -> u32;
    fn max_delay_seconds(&self) -> u64;
    fn tries(&self) -> usize;
    fn timeout_seconds(&self) -> Option<u64>;
    fn user_agent(&self) -> Option<&str>;
    fn back_to_date(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ScrapedEntry>>;
    async fn transform(&self, data: Vec<ScrapedEntry>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
