use crate::domain::ports::ConfigProvider;
use crate::utils::error::{HousingError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::core::data_manager::DEFAULT_DATA_FILENAME;
pub use crate::core::scraped_dates::DEFAULT_DATES_FILENAME;

pub const DEFAULT_BASE_URL: &str = "https://www.booli.se/";
pub const DEFAULT_DATA_DIR: &str = "data_storage";
pub const DEFAULT_BACK_TO_DATE: &str = "2015-01-01";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Above ~200 the site gets no faster and flagging gets likelier.
    pub max_requests_per_minute: u32,
    pub max_delay_seconds: u64,
    pub tries: usize,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_requests_per_minute: 200,
            max_delay_seconds: 20,
            tries: 2,
            timeout_seconds: Some(30),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub data_filename: String,
    pub dates_filename: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            data_filename: DEFAULT_DATA_FILENAME.to_string(),
            dates_filename: DEFAULT_DATES_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub back_to_date: String,
    pub first_page: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            back_to_date: DEFAULT_BACK_TO_DATE.to_string(),
            first_page: 0,
        }
    }
}

impl ScraperConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HousingError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HousingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| HousingError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.base_url", &self.source.base_url)?;
        if !self.source.base_url.ends_with('/') {
            return Err(HousingError::InvalidConfigValueError {
                field: "source.base_url".to_string(),
                value: self.source.base_url.clone(),
                reason: "Base URL must end with '/' so endpoints can be appended".to_string(),
            });
        }
        validation::validate_range(
            "source.max_requests_per_minute",
            self.source.max_requests_per_minute,
            1,
            6000,
        )?;
        validation::validate_positive_number("source.tries", self.source.tries, 1)?;
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        validation::validate_non_empty_string("storage.data_filename", &self.storage.data_filename)?;
        validation::validate_non_empty_string(
            "storage.dates_filename",
            &self.storage.dates_filename,
        )?;

        validation::validate_date("schedule.back_to_date", &self.schedule.back_to_date)?;

        Ok(())
    }
}

impl ConfigProvider for ScraperConfig {
    fn base_url(&self) -> &str {
        &self.source.base_url
    }

    fn data_dir(&self) -> &str {
        &self.storage.data_dir
    }

    fn data_filename(&self) -> &str {
        &self.storage.data_filename
    }

    fn dates_filename(&self) -> &str {
        &self.storage.dates_filename
    }

    fn max_requests_per_minute(&self) -> u32 {
        self.source.max_requests_per_minute
    }

    fn max_delay_seconds(&self) -> u64 {
        self.source.max_delay_seconds
    }

    fn tries(&self) -> usize {
        self.source.tries
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.source.timeout_seconds
    }

    fn user_agent(&self) -> Option<&str> {
        self.source.user_agent.as_deref()
    }

    fn back_to_date(&self) -> &str {
        &self.schedule.back_to_date
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
