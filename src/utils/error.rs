use thiserror::Error;

#[derive(Error, Debug)]
pub enum HousingError {
    #[error("Request to {url} failed: {source}")]
    RequestError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Rate limit wait for {endpoint} exceeded {max_delay_secs}s")]
    RateLimitedError { endpoint: String, max_delay_secs: u64 },

    #[error("{endpoint} already scraped; skipping")]
    AlreadyScrapedError { endpoint: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Entry '{entry_id}' is missing data: {message}")]
    MissingDataError { entry_id: String, message: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    InputOutOfRangeError {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Geocoding failed: {message}")]
    GeocodeError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a run that ended with an error of this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl HousingError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn missing_data(entry_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingDataError {
            entry_id: entry_id.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RequestError { .. }
            | Self::HttpStatusError { .. }
            | Self::RateLimitedError { .. }
            | Self::AlreadyScrapedError { .. }
            | Self::GeocodeError { .. } => ErrorCategory::Network,
            Self::ProcessingError { .. }
            | Self::MissingDataError { .. }
            | Self::SerializationError(_)
            | Self::DateParseError(_) => ErrorCategory::Data,
            Self::CsvError(_) | Self::IoError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::InputOutOfRangeError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyScrapedError { .. } => ErrorSeverity::Low,
            Self::RequestError { .. }
            | Self::HttpStatusError { .. }
            | Self::RateLimitedError { .. }
            | Self::GeocodeError { .. } => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Whether the same request may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestError { source, .. } => source.is_timeout() || source.is_connect(),
            Self::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
            Self::RateLimitedError { .. } => true,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check connectivity, or lower --max-requests-per-minute if the site is throttling"
            }
            ErrorCategory::Data => {
                "The page layout may have changed; inspect the stored entry or page source"
            }
            ErrorCategory::Storage => "Check that the data directory exists and is writable",
            ErrorCategory::Configuration => "Review the command line flags and the config file",
            ErrorCategory::Validation => {
                "The input lies outside the training domain; a valuation would not be reliable"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::RequestError { url, .. } | Self::HttpStatusError { url, .. } => {
                format!("Could not fetch {url}")
            }
            Self::InputOutOfRangeError { .. } | Self::InvalidConfigValueError { .. } => {
                self.to_string()
            }
            Self::IoError(e) => format!("File system problem: {e}"),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HousingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_scraped_is_low_severity() {
        let err = HousingError::AlreadyScrapedError {
            endpoint: "bostad/1".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "bostad/1 already scraped; skipping");
    }

    #[test]
    fn test_http_status_retryable() {
        let server_err = HousingError::HttpStatusError {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let not_found = HousingError::HttpStatusError {
            url: "https://example.com".to_string(),
            status: 404,
        };
        assert!(server_err.is_retryable());
        assert!(!not_found.is_retryable());
        assert_eq!(not_found.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_out_of_range_message() {
        let err = HousingError::InputOutOfRangeError {
            field: "living_area".to_string(),
            value: 0.5,
            min: 1.0,
            max: 3.0,
        };
        assert_eq!(err.to_string(), "living_area must be between 1 and 3, got 0.5");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let io = HousingError::IoError(std::io::Error::other("disk full"));
        assert_eq!(io.severity().exit_code(), 3);
        assert_eq!(HousingError::processing("bad page").severity().exit_code(), 1);
        assert_eq!(ErrorSeverity::Low.exit_code(), 0);
    }
}
