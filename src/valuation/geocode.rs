use crate::utils::error::{HousingError, Result};
use crate::utils::validation::validate_url;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_GEOCODER_URL: &str = "https://www.google.com/maps/place/";

// Maps URLs carry the view centre as `@lat,lon,zoom`.
static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?),").expect("coordinates pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub street_number: String,
    pub municipality: String,
}

/// `Attundavägen`, `14`, `Täby` -> `Attundavägen+14,+Täby`
pub fn format_search_query(street: &str, street_number: &str, municipality: &str) -> String {
    format!("{}+{},+{}", street, street_number, municipality)
}

pub fn extract_coordinates(text: &str) -> Result<Coordinates> {
    let caps = COORDINATES
        .captures(text)
        .ok_or_else(|| HousingError::GeocodeError {
            message: format!("Could not derive coordinates from {}", text),
        })?;

    let parse = |s: &str| {
        s.parse::<f64>().map_err(|e| HousingError::GeocodeError {
            message: format!("Invalid coordinate '{}': {}", s, e),
        })
    };
    Ok(Coordinates {
        latitude: parse(&caps[1])?,
        longitude: parse(&caps[2])?,
    })
}

/// Resolves addresses to coordinates through a maps place search.
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("geocoder_url", base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HousingError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub async fn geocode(&self, address: &Address) -> Result<Coordinates> {
        let url = format!(
            "{}{}",
            self.base_url,
            format_search_query(&address.street, &address.street_number, &address.municipality)
        );
        tracing::debug!("Geocoding via {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| HousingError::RequestError {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(HousingError::HttpStatusError {
                url,
                status: response.status().as_u16(),
            });
        }

        let final_url = response.url().to_string();
        if let Ok(coordinates) = extract_coordinates(&final_url) {
            tracing::debug!("Coordinates read from redirect target {}", final_url);
            return Ok(coordinates);
        }

        let body = response
            .text()
            .await
            .map_err(|source| HousingError::RequestError {
                url: final_url.clone(),
                source,
            })?;
        extract_coordinates(&body).map_err(|_| HousingError::GeocodeError {
            message: format!(
                "Address coordinates could not be found: given url {}, url at exit {}",
                url, final_url
            ),
        })
    }
}
