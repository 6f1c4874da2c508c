use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_strictly_positive, Validate};
use crate::valuation::geocode::{Address, Coordinates};
use crate::valuation::validator::ModelInput;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A request to value one home. Coordinates are optional; without them the
/// address is geocoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub address: Address,
    pub construction_year: i32,
    pub living_area: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl ValuationRequest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let request: Self = serde_json::from_str(&content)?;
        request.validate()?;
        Ok(request)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    pub fn into_model_input(self, coordinates: Coordinates) -> ModelInput {
        ModelInput {
            construction_year: self.construction_year,
            living_area: self.living_area,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        }
    }
}

impl Validate for ValuationRequest {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("address.street", &self.address.street)?;
        validate_non_empty_string("address.street_number", &self.address.street_number)?;
        validate_non_empty_string("address.municipality", &self.address.municipality)?;
        validate_strictly_positive("living_area", self.living_area)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "address": {"street": "Attundavägen", "street_number": "14", "municipality": "Täby"},
        "construction_year": 1968,
        "living_area": 62.5
    }"#;

    #[test]
    fn test_request_without_coordinates() {
        let request: ValuationRequest = serde_json::from_str(REQUEST).unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.coordinates(), None);
        assert_eq!(request.address.municipality, "Täby");
    }

    #[test]
    fn test_partial_coordinates_are_ignored() {
        let mut request: ValuationRequest = serde_json::from_str(REQUEST).unwrap();
        request.latitude = Some(59.44);
        assert_eq!(request.coordinates(), None);

        request.longitude = Some(18.06);
        assert_eq!(
            request.coordinates(),
            Some(Coordinates {
                latitude: 59.44,
                longitude: 18.06
            })
        );
    }

    #[test]
    fn test_into_model_input() {
        let request: ValuationRequest = serde_json::from_str(REQUEST).unwrap();
        let input = request.into_model_input(Coordinates {
            latitude: 59.4430162,
            longitude: 18.0678478,
        });

        assert_eq!(input.construction_year, 1968);
        assert_eq!(input.living_area, 62.5);
        assert_eq!(input.latitude, 59.4430162);
    }

    #[test]
    fn test_from_file_rejects_empty_street() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("request.json");
        std::fs::write(&path, REQUEST.replace("Attundavägen", " ")).unwrap();

        assert!(ValuationRequest::from_file(&path).is_err());
    }
}
