use crate::utils::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Per-feature ranges seen in the training data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingDomain {
    features: BTreeMap<String, FeatureRange>,
}

impl TrainingDomain {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let domain: Self = serde_json::from_str(json)?;
        for (field, range) in &domain.features {
            if range.min > range.max {
                return Err(HousingError::ConfigValidationError {
                    field: field.clone(),
                    message: format!("min {} is greater than max {}", range.min, range.max),
                });
            }
        }
        Ok(domain)
    }

    pub fn range(&self, feature: &str) -> Option<&FeatureRange> {
        self.features.get(feature)
    }

    pub fn insert(&mut self, feature: impl Into<String>, range: FeatureRange) {
        self.features.insert(feature.into(), range);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    pub construction_year: i32,
    pub living_area: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl ModelInput {
    fn features(&self) -> [(&'static str, f64); 4] {
        [
            ("construction_year", f64::from(self.construction_year)),
            ("living_area", self.living_area),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
        ]
    }

    /// Features the domain does not mention are accepted as is.
    pub fn validate_against(&self, domain: &TrainingDomain) -> Result<()> {
        for (field, value) in self.features() {
            if let Some(range) = domain.range(field) {
                if !range.contains(value) {
                    return Err(HousingError::InputOutOfRangeError {
                        field: field.to_string(),
                        value,
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = r#"{
        "construction_year": {"min": 1, "max": 3},
        "living_area": {"min": 1, "max": 3},
        "latitude": {"min": 1, "max": 3},
        "longitude": {"min": 1, "max": 3}
    }"#;

    fn input(construction_year: i32, living_area: f64, latitude: f64, longitude: f64) -> ModelInput {
        ModelInput {
            construction_year,
            living_area,
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let domain = TrainingDomain::from_json_str(DOMAIN).unwrap();
        assert!(input(2, 2.0, 2.0, 2.0).validate_against(&domain).is_ok());
        // bounds are inclusive
        assert!(input(1, 3.0, 1.0, 3.0).validate_against(&domain).is_ok());
    }

    #[test]
    fn test_out_of_range_names_the_field() {
        let domain = TrainingDomain::from_json_str(DOMAIN).unwrap();

        let err = input(0, 2.0, 1.0, 1.0).validate_against(&domain).unwrap_err();

        assert_eq!(err.to_string(), "construction_year must be between 1 and 3, got 0");
    }

    #[test]
    fn test_features_missing_from_domain_are_accepted() {
        let mut domain = TrainingDomain::default();
        domain.insert("living_area", FeatureRange { min: 10.0, max: 300.0 });

        assert!(input(1850, 55.5, 59.4, 18.0).validate_against(&domain).is_ok());
        assert!(input(1850, 5.0, 59.4, 18.0).validate_against(&domain).is_err());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = TrainingDomain::from_json_str(r#"{"living_area": {"min": 5, "max": 1}}"#)
            .unwrap_err();
        assert!(matches!(err, HousingError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_training_domain_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("training_domain.json");
        std::fs::write(&path, DOMAIN).unwrap();

        let domain = TrainingDomain::from_file(&path).unwrap();

        assert_eq!(domain.range("latitude"), Some(&FeatureRange { min: 1.0, max: 3.0 }));
    }
}
