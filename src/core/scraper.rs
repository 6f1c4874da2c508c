use crate::core::data_manager::DataManager;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{HousingError, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

/// Minimum spacing between request starts, derived from the per-minute budget.
///
/// The token bucket alone would allow a burst of a full minute's budget; the
/// throttle spreads requests out evenly instead.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_request: Option<Instant>,
}

impl Throttle {
    pub fn new(max_requests_per_minute: NonZeroU32) -> Self {
        Self {
            interval: Duration::from_secs_f64(60.0 / f64::from(max_requests_per_minute.get())),
            last_request: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_request = Some(now);
    }
}

/// Fetches pages relative to a base URL with rate limiting, throttling and
/// retries, refusing endpoints the [`DataManager`] already holds.
pub struct Scraper {
    base_url: String,
    client: Client,
    rate_limiter: DefaultDirectRateLimiter,
    throttle: Throttle,
    max_delay: Duration,
    tries: usize,
    pub data_manager: DataManager,
}

impl Scraper {
    pub fn new<C: ConfigProvider>(config: &C, data_manager: DataManager) -> Result<Self> {
        let rpm = NonZeroU32::new(config.max_requests_per_minute()).ok_or_else(|| {
            HousingError::InvalidConfigValueError {
                field: "source.max_requests_per_minute".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            }
        })?;
        if config.tries() == 0 {
            return Err(HousingError::InvalidConfigValueError {
                field: "source.tries".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds() {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        if let Some(user_agent) = config.user_agent() {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(|e| HousingError::ConfigError {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            client,
            rate_limiter: RateLimiter::direct(Quota::per_minute(rpm)),
            throttle: Throttle::new(rpm),
            max_delay: Duration::from_secs(config.max_delay_seconds()),
            tries: config.tries(),
            data_manager,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tries(&self) -> usize {
        self.tries
    }

    /// Fetches `endpoint`, retrying retryable failures up to the configured number of tries.
    pub async fn get(&mut self, endpoint: &str) -> Result<Vec<u8>> {
        if self.data_manager.is_endpoint_scraped(endpoint) {
            return Err(HousingError::AlreadyScrapedError {
                endpoint: endpoint.to_string(),
            });
        }

        let mut attempt = 1;
        loop {
            self.throttle_requests().await;
            match self.try_get(endpoint).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < self.tries && e.is_retryable() => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.tries,
                        endpoint,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(&self, endpoint: &str) -> Result<Vec<u8>> {
        if tokio::time::timeout(self.max_delay, self.rate_limiter.until_ready())
            .await
            .is_err()
        {
            return Err(HousingError::RateLimitedError {
                endpoint: endpoint.to_string(),
                max_delay_secs: self.max_delay.as_secs(),
            });
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| HousingError::RequestError {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HousingError::HttpStatusError {
                url,
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            tracing::debug!("Received 204 No Content for {}", endpoint);
            return Ok(Vec::new());
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| HousingError::RequestError { url, source })?;
        Ok(body.to_vec())
    }

    async fn throttle_requests(&mut self) {
        let wait = self.throttle.wait_time(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        self.throttle.mark(Instant::now());
    }
}
