use housing_pricer::processing::LISTING_COLUMNS;
use housing_pricer::{DataManager, EtlEngine, ListingsPipeline, LocalStorage};
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;

fn sold_listing(booli_id: u64, municipality: &str, price: u64) -> serde_json::Value {
    json!({
        format!("SoldProperty:{}", booli_id): {
            "booliId": booli_id,
            "soldDate": "2023-12-04",
            "location": {"region": {"municipalityName": municipality}},
            "soldPrice": {"raw": price},
            "salesOfResidence": [{"booliId": 900}]
        },
        "market_status": "Såld"
    })
}

#[tokio::test]
async fn test_scraped_data_to_csv() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    // two sessions, so the file holds two gzip members
    {
        let mut manager = DataManager::open(data_dir.path()).unwrap();
        manager
            .append_data_to_file("bostad/1", Some("2023-12-04"), sold_listing(1, "Täby", 3250000))
            .unwrap();
        manager
            .append_data_to_file("annons/2", Some("2023-12-04"), json!({"market_status": "Såld"}))
            .unwrap();
    }
    {
        let mut manager = DataManager::open(data_dir.path()).unwrap();
        manager
            .append_data_to_file("bostad/3", Some("2023-12-03"), sold_listing(3, "Solna", 4100000))
            .unwrap();
    }

    let output_path = output_dir.path().to_str().unwrap().to_string();
    let pipeline = ListingsPipeline::new(
        LocalStorage::new(output_path.clone()),
        data_dir.path().to_str().unwrap(),
        "scraped_data.gz",
        &output_path,
    );
    let engine = EtlEngine::new(pipeline);

    let result_path = engine.run().await.unwrap();

    assert_eq!(result_path, format!("{}/listings.csv", output_path));
    let mut reader = csv::Reader::from_path(output_dir.path().join("listings.csv")).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, LISTING_COLUMNS);

    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][column("url_listing_id")], "1");
    assert_eq!(&rows[0][column("municipality")], "Täby");
    assert_eq!(&rows[1][column("municipality")], "Solna");
    assert_eq!(&rows[1][column("booli_ids_of_previous_sales")], "900");
    assert_eq!(&rows[1][column("n_previous_sales")], "1");
    // missing values are empty cells
    assert_eq!(&rows[1][column("energy_class")], "");
}

#[tokio::test]
async fn test_truncated_tail_keeps_complete_entries() {
    let data_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    {
        let mut manager = DataManager::open(data_dir.path()).unwrap();
        manager
            .append_data_to_file("bostad/1", Some("2023-12-04"), sold_listing(1, "Täby", 3250000))
            .unwrap();
    }
    // a crashed session leaves half a gzip member behind
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(data_dir.path().join("scraped_data.gz"))
            .unwrap();
        file.write_all(&[0x1f, 0x8b, 0x08, 0x00]).unwrap();
    }

    let output_path = output_dir.path().to_str().unwrap().to_string();
    let pipeline = ListingsPipeline::new(
        LocalStorage::new(output_path.clone()),
        data_dir.path().to_str().unwrap(),
        "scraped_data.gz",
        &output_path,
    );

    EtlEngine::new(pipeline).run().await.unwrap();

    let mut reader = csv::Reader::from_path(output_dir.path().join("listings.csv")).unwrap();
    assert_eq!(reader.records().count(), 1);
}
