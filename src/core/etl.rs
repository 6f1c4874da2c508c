use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting listings processing...");

        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} scraped entries", raw_data.len());
        self.monitor.log_stats("Extract");

        let transformed_result = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Transformed {} listings ({} entries without sale data skipped)",
            transformed_result.records.len(),
            transformed_result.skipped_entries
        );
        self.monitor.log_stats("Transform");

        let output_path = self.pipeline.load(transformed_result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
