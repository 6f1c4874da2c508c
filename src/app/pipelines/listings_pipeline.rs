use crate::core::data_manager::DataManager;
use crate::core::{Pipeline, ScrapedEntry, Storage, TransformResult};
use crate::processing::{format_entry, LISTING_COLUMNS};
use crate::utils::error::{HousingError, Result};
use std::path::PathBuf;

pub const OUTPUT_FILENAME: &str = "listings.csv";

/// Scraped data file -> flat listings CSV.
pub struct ListingsPipeline<S: Storage> {
    storage: S,
    data_file: PathBuf,
    output_dir: String,
}

impl<S: Storage> ListingsPipeline<S> {
    pub fn new(storage: S, data_dir: &str, data_filename: &str, output_dir: &str) -> Self {
        Self {
            storage,
            data_file: PathBuf::from(data_dir).join(data_filename),
            output_dir: output_dir.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for ListingsPipeline<S> {
    async fn extract(&self) -> Result<Vec<ScrapedEntry>> {
        tracing::debug!("Reading scraped data from {}", self.data_file.display());
        let path = self.data_file.clone();

        tokio::task::spawn_blocking(move || {
            let mut entries = DataManager::read_entries(&path)?;
            let loaded: Vec<ScrapedEntry> = entries.by_ref().collect();
            if entries.is_truncated() {
                tracing::warn!(
                    "⚠️ {} ends in a truncated record; read {} entries before it",
                    path.display(),
                    loaded.len()
                );
            }
            if entries.skipped_lines() > 0 {
                tracing::warn!("⚠️ Skipped {} malformed lines", entries.skipped_lines());
            }
            Ok(loaded)
        })
        .await
        .map_err(|e| HousingError::processing(format!("Reading task failed: {}", e)))?
    }

    async fn transform(&self, data: Vec<ScrapedEntry>) -> Result<TransformResult> {
        let mut records = Vec::with_capacity(data.len());
        let mut skipped_entries = 0;

        for entry in &data {
            match format_entry(entry) {
                Ok(record) => records.push(record),
                Err(HousingError::MissingDataError { entry_id, message }) => {
                    tracing::debug!("Skipping {}: {}", entry_id, message);
                    skipped_entries += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(LISTING_COLUMNS)?;
        for record in &records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| HousingError::processing(format!("Failed to finish CSV: {}", e)))?;
        let csv_output = String::from_utf8(bytes)
            .map_err(|e| HousingError::processing(format!("CSV is not UTF-8: {}", e)))?;

        Ok(TransformResult {
            records,
            csv_output,
            skipped_entries,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = format!("{}/{}", self.output_dir, OUTPUT_FILENAME);

        tracing::debug!(
            "Writing {} listings ({} bytes) to storage",
            result.records.len(),
            result.csv_output.len()
        );
        self.storage
            .write_file(OUTPUT_FILENAME, result.csv_output.as_bytes())
            .await?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn sold(id: &str, price: u64) -> ScrapedEntry {
        let booli_id = id.split('/').nth(1).unwrap();
        ScrapedEntry {
            id: id.to_string(),
            date: Some("2023-12-04".to_string()),
            data: json!({
                format!("SoldProperty:{}", booli_id): {
                    "booliId": booli_id,
                    "streetAddress": "Storgatan 1, Stockholm",
                    "soldPrice": {"raw": price}
                },
                "market_status": "Såld"
            }),
        }
    }

    #[tokio::test]
    async fn test_extract_reads_data_file() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut manager = DataManager::open(temp_dir.path()).unwrap();
            manager
                .append_data_to_file("bostad/1", Some("2023-12-04"), json!({"a": 1}))
                .unwrap();
            manager.close().unwrap();
        }
        let data_dir = temp_dir.path().to_str().unwrap();
        let pipeline = ListingsPipeline::new(
            MockStorage::new(),
            data_dir,
            crate::config::toml_config::DEFAULT_DATA_FILENAME,
            "out",
        );

        let entries = pipeline.extract().await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "bostad/1");
    }

    #[tokio::test]
    async fn test_extract_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = ListingsPipeline::new(
            MockStorage::new(),
            temp_dir.path().to_str().unwrap(),
            "missing.gz",
            "out",
        );

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, HousingError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_skips_entries_without_sale_data() {
        let pipeline = ListingsPipeline::new(MockStorage::new(), "data", "d.gz", "out");
        let entries = vec![
            sold("bostad/10", 3250000),
            ScrapedEntry {
                id: "annons/11".to_string(),
                date: None,
                data: json!({"market_status": "Till salu"}),
            },
            sold("annons/12", 1995000),
        ];

        let result = pipeline.transform(entries).await.unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.skipped_entries, 1);

        let mut reader = csv::Reader::from_reader(result.csv_output.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), LISTING_COLUMNS.len());
        assert_eq!(&headers[0], "url_listing_type");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "10");
        // quoted because of the comma
        assert!(result.csv_output.contains("\"Storgatan 1, Stockholm\""));
        let sold_price = headers.iter().position(|h| h == "sold_price").unwrap();
        assert_eq!(&rows[1][sold_price], "1995000.0");
    }

    #[tokio::test]
    async fn test_transform_empty_still_has_header() {
        let pipeline = ListingsPipeline::new(MockStorage::new(), "data", "d.gz", "out");

        let result = pipeline.transform(Vec::new()).await.unwrap();

        assert_eq!(result.csv_output.trim_end(), LISTING_COLUMNS.join(","));
    }

    #[tokio::test]
    async fn test_load_writes_csv() {
        let storage = MockStorage::new();
        let pipeline = ListingsPipeline::new(storage.clone(), "data", "d.gz", "out");
        let result = TransformResult {
            records: Vec::new(),
            csv_output: "a,b\n".to_string(),
            skipped_entries: 0,
        };

        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "out/listings.csv");
        assert_eq!(storage.get_file(OUTPUT_FILENAME).await.unwrap(), b"a,b\n");
    }
}
