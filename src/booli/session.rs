use crate::booli::extract::{extract_listing_refs, extract_relevant_data};
use crate::core::scraped_dates::ScrapedDatesManager;
use crate::core::scraper::Scraper;
use crate::domain::model::ListingRef;
use crate::utils::error::{HousingError, Result};
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation::DATE_FORMAT;
use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub fn search_endpoint(date: &str, page: u32) -> String {
    format!(
        "sok/slutpriser?maxSoldDate={}&minSoldDate={}&page={}",
        date, date, page
    )
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub duration: Duration,
    pub back_to_date: NaiveDate,
    pub today: NaiveDate,
    pub first_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    DeadlineReached,
    ShutdownRequested,
    /// A search page could not be fetched; its date is left for the next session.
    SearchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub listings_scraped: usize,
    pub listings_skipped: usize,
    pub dates_completed: usize,
    pub stop_reason: StopReason,
}

struct Deadline<'a> {
    /// `None` when the duration reaches past what `Instant` can represent.
    at: Option<Instant>,
    shutdown: &'a CancellationToken,
}

impl<'a> Deadline<'a> {
    fn after(duration: Duration, shutdown: &'a CancellationToken) -> Self {
        Self {
            at: Instant::now().checked_add(duration),
            shutdown,
        }
    }

    fn check(&self) -> Option<StopReason> {
        if self.shutdown.is_cancelled() {
            Some(StopReason::ShutdownRequested)
        } else if self.at.is_some_and(|at| Instant::now() >= at) {
            Some(StopReason::DeadlineReached)
        } else {
            None
        }
    }
}

/// Scrapes sold listings date by date, newest first, until every date down to
/// `back_to_date` is done, the duration runs out, or `shutdown` is cancelled.
///
/// A date is recorded as scraped only after all of its search pages were
/// walked, so an interrupted date is picked up again by the next session.
pub async fn scrape_listings(
    scraper: &mut Scraper,
    dates_manager: &mut ScrapedDatesManager,
    options: &ScrapeOptions,
    shutdown: &CancellationToken,
    monitor: &SystemMonitor,
) -> Result<ScrapeSummary> {
    let deadline = Deadline::after(options.duration, shutdown);
    let mut summary = ScrapeSummary {
        listings_scraped: 0,
        listings_skipped: 0,
        dates_completed: 0,
        stop_reason: StopReason::Completed,
    };

    let dates = dates_manager.dates_to_scrape(options.back_to_date, options.today);
    tracing::info!(
        "🗓️ {} dates left to scrape back to {}",
        dates.len(),
        options.back_to_date
    );

    for date in dates {
        if let Some(reason) = deadline.check() {
            summary.stop_reason = reason;
            break;
        }

        let date_str = date.format(DATE_FORMAT).to_string();
        tracing::info!("Starting to scrape from date: {}", date_str);

        if let Some(reason) =
            scrape_date(scraper, &date_str, options.first_page, &deadline, &mut summary).await
        {
            tracing::info!("Stopped in the middle of {}; it will be resumed", date_str);
            summary.stop_reason = reason;
            break;
        }

        dates_manager.mark_date_scraped(date)?;
        summary.dates_completed += 1;
        tracing::info!("Finished scraping date: {}", date_str);
        monitor.log_stats(&format!("Date {}", date_str));
    }

    tracing::info!(
        "Session over ({:?}): {} listings scraped, {} skipped, {} dates completed",
        summary.stop_reason,
        summary.listings_scraped,
        summary.listings_skipped,
        summary.dates_completed
    );
    Ok(summary)
}

/// Walks the search pages of one date. Returns why it stopped early, if it did.
async fn scrape_date(
    scraper: &mut Scraper,
    date: &str,
    first_page: u32,
    deadline: &Deadline<'_>,
    summary: &mut ScrapeSummary,
) -> Option<StopReason> {
    let mut page = first_page;
    loop {
        if let Some(reason) = deadline.check() {
            return Some(reason);
        }

        let endpoint = search_endpoint(date, page);
        let listings = match fetch_listing_refs(scraper, &endpoint).await {
            Ok(listings) if listings.is_empty() => return None,
            Ok(listings) => listings,
            Err(e) => {
                tracing::warn!("⚠️ Search page {} failed: {}", endpoint, e);
                return Some(StopReason::SearchFailed);
            }
        };

        tracing::info!(
            "Scraping {} listings from search page number {}...",
            listings.len(),
            page
        );
        if let Some(reason) = process_listings(scraper, &listings, date, deadline, summary).await
        {
            return Some(reason);
        }
        tracing::info!("Number of listings scraped: {}", summary.listings_scraped);
        page += 1;
    }
}

async fn fetch_listing_refs(
    scraper: &mut Scraper,
    search_endpoint: &str,
) -> Result<Vec<ListingRef>> {
    let content = scraper.get(search_endpoint).await?;
    Ok(extract_listing_refs(&String::from_utf8_lossy(&content)))
}

async fn process_listings(
    scraper: &mut Scraper,
    listings: &[ListingRef],
    date: &str,
    deadline: &Deadline<'_>,
    summary: &mut ScrapeSummary,
) -> Option<StopReason> {
    for listing in listings {
        if let Some(reason) = deadline.check() {
            return Some(reason);
        }

        let endpoint = listing.endpoint();
        match scrape_listing(scraper, &endpoint, date).await {
            Ok(()) => summary.listings_scraped += 1,
            Err(e) => {
                summary.listings_skipped += 1;
                match e {
                    HousingError::AlreadyScrapedError { .. } => tracing::debug!("{}", e),
                    HousingError::IoError(_) | HousingError::SerializationError(_) => {
                        tracing::error!("Failed to store {}: {}", endpoint, e)
                    }
                    _ => tracing::info!("Skipping {}: {}", endpoint, e),
                }
            }
        }
    }
    None
}

async fn scrape_listing(scraper: &mut Scraper, endpoint: &str, date: &str) -> Result<()> {
    let content = scraper.get(endpoint).await?;
    let data = extract_relevant_data(&String::from_utf8_lossy(&content))?;
    scraper
        .data_manager
        .append_data_to_file(endpoint, Some(date), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_endpoint() {
        assert_eq!(
            search_endpoint("2023-12-04", 3),
            "sok/slutpriser?maxSoldDate=2023-12-04&minSoldDate=2023-12-04&page=3"
        );
    }

    #[test]
    fn test_deadline_prefers_shutdown() {
        let token = CancellationToken::new();
        let deadline = Deadline::after(Duration::ZERO, &token);
        assert_eq!(deadline.check(), Some(StopReason::DeadlineReached));

        token.cancel();
        assert_eq!(deadline.check(), Some(StopReason::ShutdownRequested));
    }

    #[test]
    fn test_unrepresentable_duration_means_no_deadline() {
        let token = CancellationToken::new();
        let deadline = Deadline::after(Duration::MAX, &token);

        assert_eq!(deadline.at, None);
        assert_eq!(deadline.check(), None);

        token.cancel();
        assert_eq!(deadline.check(), Some(StopReason::ShutdownRequested));
    }
}
