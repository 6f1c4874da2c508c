use crate::utils::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booli serves sold listings under two URL prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Annons,
    Bostad,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Annons => "annons",
            ListingType::Bostad => "bostad",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingType {
    type Err = HousingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "annons" => Ok(ListingType::Annons),
            "bostad" => Ok(ListingType::Bostad),
            other => Err(HousingError::processing(format!(
                "Unknown listing type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRef {
    pub listing_type: ListingType,
    pub listing_id: String,
}

impl ListingRef {
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.listing_type, self.listing_id)
    }
}

/// One line of the scraped data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedEntry {
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    pub data: serde_json::Value,
}

/// Flat, model-ready view of a scraped sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingRecord {
    pub url_listing_type: String,
    pub url_listing_id: u64,
    pub booli_id: Option<i64>,
    pub sold_date: Option<String>,
    pub days_listed: Option<i64>,
    pub residence_type: Option<String>,
    pub address: Option<String>,
    pub apartment_number: Option<String>,
    pub urban_area: Option<String>,
    pub municipality: Option<String>,
    pub construction_year: Option<i64>,
    pub list_price: Option<f64>,
    pub sold_price: Option<f64>,
    pub sold_price_type: Option<String>,
    pub first_price: Option<f64>,
    pub monthly_payment: Option<String>,
    pub rent: Option<f64>,
    pub operating_cost: Option<f64>,
    pub energy_class: Option<String>,
    pub floor: Option<f64>,
    pub building_floors: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub has_solar_panels: Option<bool>,
    pub agency_id: Option<String>,
    pub agent_id: Option<String>,
    /// `;`-joined ids, since CSV cells are flat.
    pub booli_ids_of_previous_sales: String,
    pub n_previous_sales: usize,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub records: Vec<ListingRecord>,
    pub csv_output: String,
    pub skipped_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_type_round_trips_through_str() {
        assert_eq!("bostad".parse::<ListingType>().unwrap(), ListingType::Bostad);
        assert_eq!(ListingType::Annons.to_string(), "annons");
        assert!("villa".parse::<ListingType>().is_err());
    }

    #[test]
    fn test_listing_ref_endpoint() {
        let listing = ListingRef {
            listing_type: ListingType::Bostad,
            listing_id: "2556516".to_string(),
        };
        assert_eq!(listing.endpoint(), "bostad/2556516");
    }

    #[test]
    fn test_scraped_entry_without_date_deserializes() {
        let entry: ScrapedEntry =
            serde_json::from_str(r#"{"id": "annons/1", "data": {"a": 1}}"#).unwrap();
        assert_eq!(entry.date, None);
        assert_eq!(entry.data["a"], 1);
    }
}
